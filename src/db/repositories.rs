//! Database queries for repositories.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::entity::collaborator::{self, Entity as Collaborator};
use crate::entity::repository::{self, ActiveModel, Entity as Repository};
use crate::entity::review::{self, Entity as Review};
use crate::error::{AppError, AppResult};

use super::DbPool;

/// Fields needed to create or refresh a repository row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRecord {
    pub id: i64,
    pub name: String,
    pub owner: String,
    pub owner_id: i64,
    pub installation_id: Option<i64>,
}

impl DbPool {
    /// Get a repository by GitHub id.
    pub async fn find_repository(&self, id: i64) -> AppResult<Option<repository::Model>> {
        let result = Repository::find_by_id(id).one(self.connection()).await?;
        Ok(result)
    }

    /// Insert a new enabled repository.
    pub async fn insert_repository(
        &self,
        record: &RepositoryRecord,
    ) -> AppResult<repository::Model> {
        let now = Utc::now();

        let model = ActiveModel {
            id: Set(record.id),
            name: Set(record.name.clone()),
            owner: Set(record.owner.clone()),
            owner_id: Set(record.owner_id),
            installation_id: Set(record.installation_id),
            enabled: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model.insert(self.connection()).await.map_err(|e| {
            AppError::Database(format!("Failed to insert repository {}: {}", record.id, e))
        })?;

        Ok(result)
    }

    /// Insert the repository unless a row with its id already exists.
    ///
    /// Returns `true` when a row was created.
    pub async fn insert_repository_if_absent(&self, record: &RepositoryRecord) -> AppResult<bool> {
        if self.find_repository(record.id).await?.is_some() {
            return Ok(false);
        }
        self.insert_repository(record).await?;
        Ok(true)
    }

    /// Create the repository, or refresh an existing row and re-enable it.
    pub async fn upsert_repository(
        &self,
        record: &RepositoryRecord,
    ) -> AppResult<repository::Model> {
        let Some(existing) = self.find_repository(record.id).await? else {
            return self.insert_repository(record).await;
        };

        let mut active: ActiveModel = existing.into();
        active.name = Set(record.name.clone());
        active.owner = Set(record.owner.clone());
        active.owner_id = Set(record.owner_id);
        active.installation_id = Set(record.installation_id);
        active.enabled = Set(true);
        active.updated_at = Set(Utc::now());

        let updated = active.update(self.connection()).await.map_err(|e| {
            AppError::Database(format!("Failed to update repository {}: {}", record.id, e))
        })?;

        Ok(updated)
    }

    /// Enable or disable every repository of an installation.
    ///
    /// Returns the number of rows touched.
    pub async fn set_installation_repositories_enabled(
        &self,
        installation_id: i64,
        enabled: bool,
    ) -> AppResult<u64> {
        let result = Repository::update_many()
            .col_expr(
                repository::Column::Enabled,
                sea_orm::sea_query::Expr::value(enabled),
            )
            .col_expr(
                repository::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(repository::Column::InstallationId.eq(installation_id))
            .exec(self.connection())
            .await?;

        Ok(result.rows_affected)
    }

    /// Enable or disable a single repository.
    pub async fn set_repository_enabled(&self, id: i64, enabled: bool) -> AppResult<u64> {
        let result = Repository::update_many()
            .col_expr(
                repository::Column::Enabled,
                sea_orm::sea_query::Expr::value(enabled),
            )
            .col_expr(
                repository::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(repository::Column::Id.eq(id))
            .exec(self.connection())
            .await?;

        Ok(result.rows_affected)
    }

    pub async fn rename_repository(&self, id: i64, name: &str) -> AppResult<u64> {
        let result = Repository::update_many()
            .col_expr(
                repository::Column::Name,
                sea_orm::sea_query::Expr::value(name),
            )
            .col_expr(
                repository::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(repository::Column::Id.eq(id))
            .exec(self.connection())
            .await?;

        Ok(result.rows_affected)
    }

    pub async fn transfer_repository(&self, id: i64, owner: &str, owner_id: i64) -> AppResult<u64> {
        let result = Repository::update_many()
            .col_expr(
                repository::Column::Owner,
                sea_orm::sea_query::Expr::value(owner),
            )
            .col_expr(
                repository::Column::OwnerId,
                sea_orm::sea_query::Expr::value(owner_id),
            )
            .col_expr(
                repository::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(repository::Column::Id.eq(id))
            .exec(self.connection())
            .await?;

        Ok(result.rows_affected)
    }

    /// Set the owner login of every repository of an installation.
    pub async fn rename_installation_owner(
        &self,
        installation_id: i64,
        owner: &str,
    ) -> AppResult<u64> {
        let result = Repository::update_many()
            .col_expr(
                repository::Column::Owner,
                sea_orm::sea_query::Expr::value(owner),
            )
            .col_expr(
                repository::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(repository::Column::InstallationId.eq(installation_id))
            .exec(self.connection())
            .await?;

        Ok(result.rows_affected)
    }

    /// Hard-delete a repository with its reviews and collaborators.
    ///
    /// Returns the number of repository rows removed (0 or 1).
    pub async fn delete_repository(&self, id: i64) -> AppResult<u64> {
        let db = self.connection();

        Review::delete_many()
            .filter(review::Column::RepositoryId.eq(id))
            .exec(db)
            .await?;

        Collaborator::delete_many()
            .filter(collaborator::Column::RepositoryId.eq(id))
            .exec(db)
            .await?;

        let result = Repository::delete_many()
            .filter(repository::Column::Id.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Enabled repositories owned by a GitHub account.
    pub async fn list_owned_repositories(
        &self,
        owner_id: i64,
    ) -> AppResult<Vec<repository::Model>> {
        let result = Repository::find()
            .filter(repository::Column::OwnerId.eq(owner_id))
            .filter(repository::Column::Enabled.eq(true))
            .order_by_asc(repository::Column::Name)
            .all(self.connection())
            .await?;

        Ok(result)
    }

    /// Enabled repositories where a local account is a linked collaborator.
    pub async fn list_collaborating_repositories(
        &self,
        account_id: i64,
    ) -> AppResult<Vec<repository::Model>> {
        let repository_ids: Vec<i64> = Collaborator::find()
            .filter(collaborator::Column::AccountId.eq(account_id))
            .all(self.connection())
            .await?
            .into_iter()
            .map(|c| c.repository_id)
            .collect();

        if repository_ids.is_empty() {
            return Ok(Vec::new());
        }

        let result = Repository::find()
            .filter(repository::Column::Id.is_in(repository_ids))
            .filter(repository::Column::Enabled.eq(true))
            .order_by_asc(repository::Column::Name)
            .all(self.connection())
            .await?;

        Ok(result)
    }
}
