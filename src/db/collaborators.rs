//! Database queries for collaborators.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use crate::entity::collaborator::{self, ActiveModel, Entity as Collaborator};
use crate::error::{AppError, AppResult};

use super::DbPool;

/// Fields needed to create or refresh a collaborator row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollaboratorRecord {
    pub repository_id: i64,
    pub github_user_id: i64,
    pub github_login: String,
    pub role: String,
    /// Linked local account, if the GitHub user has one
    pub account_id: Option<i64>,
}

impl DbPool {
    /// Get the collaborator row for a (repository, GitHub user) pair.
    pub async fn find_collaborator(
        &self,
        repository_id: i64,
        github_user_id: i64,
    ) -> AppResult<Option<collaborator::Model>> {
        let result = Collaborator::find()
            .filter(collaborator::Column::RepositoryId.eq(repository_id))
            .filter(collaborator::Column::GithubUserId.eq(github_user_id))
            .one(self.connection())
            .await?;

        Ok(result)
    }

    /// Create the collaborator, or refresh the existing row for the same
    /// (repository, GitHub user) pair.
    pub async fn upsert_collaborator(
        &self,
        record: &CollaboratorRecord,
    ) -> AppResult<collaborator::Model> {
        let now = Utc::now();
        let existing = self
            .find_collaborator(record.repository_id, record.github_user_id)
            .await?;

        let result = match existing {
            Some(model) => {
                let mut active: ActiveModel = model.into();
                active.github_login = Set(record.github_login.clone());
                active.role = Set(record.role.clone());
                active.account_id = Set(record.account_id);
                active.is_registered_user = Set(record.account_id.is_some());
                active.updated_at = Set(now);
                active.update(self.connection()).await
            }
            None => {
                let active = ActiveModel {
                    repository_id: Set(record.repository_id),
                    github_user_id: Set(record.github_user_id),
                    github_login: Set(record.github_login.clone()),
                    role: Set(record.role.clone()),
                    account_id: Set(record.account_id),
                    is_registered_user: Set(record.account_id.is_some()),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                active.insert(self.connection()).await
            }
        };

        result.map_err(|e| {
            AppError::Database(format!(
                "Failed to save collaborator {} on repository {}: {}",
                record.github_user_id, record.repository_id, e
            ))
        })
    }

    pub async fn update_collaborator_role(
        &self,
        repository_id: i64,
        github_user_id: i64,
        role: &str,
    ) -> AppResult<u64> {
        let result = Collaborator::update_many()
            .col_expr(
                collaborator::Column::Role,
                sea_orm::sea_query::Expr::value(role),
            )
            .col_expr(
                collaborator::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(collaborator::Column::RepositoryId.eq(repository_id))
            .filter(collaborator::Column::GithubUserId.eq(github_user_id))
            .exec(self.connection())
            .await?;

        Ok(result.rows_affected)
    }

    pub async fn delete_collaborator(
        &self,
        repository_id: i64,
        github_user_id: i64,
    ) -> AppResult<u64> {
        let result = Collaborator::delete_many()
            .filter(collaborator::Column::RepositoryId.eq(repository_id))
            .filter(collaborator::Column::GithubUserId.eq(github_user_id))
            .exec(self.connection())
            .await?;

        Ok(result.rows_affected)
    }

    pub async fn list_collaborators(
        &self,
        repository_id: i64,
    ) -> AppResult<Vec<collaborator::Model>> {
        let result = Collaborator::find()
            .filter(collaborator::Column::RepositoryId.eq(repository_id))
            .order_by_asc(collaborator::Column::GithubLogin)
            .all(self.connection())
            .await?;

        Ok(result)
    }

    /// Whether a local account is a linked collaborator on the repository.
    pub async fn is_linked_collaborator(
        &self,
        repository_id: i64,
        account_id: i64,
    ) -> AppResult<bool> {
        let count = Collaborator::find()
            .filter(collaborator::Column::RepositoryId.eq(repository_id))
            .filter(collaborator::Column::AccountId.eq(account_id))
            .count(self.connection())
            .await?;

        Ok(count > 0)
    }

    /// Point every collaborator row of a GitHub user at a local account.
    pub async fn link_collaborators_to_account(
        &self,
        github_user_id: i64,
        account_id: i64,
    ) -> AppResult<u64> {
        let result = Collaborator::update_many()
            .col_expr(
                collaborator::Column::AccountId,
                sea_orm::sea_query::Expr::value(Some(account_id)),
            )
            .col_expr(
                collaborator::Column::IsRegisteredUser,
                sea_orm::sea_query::Expr::value(true),
            )
            .col_expr(
                collaborator::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .filter(collaborator::Column::GithubUserId.eq(github_user_id))
            .exec(self.connection())
            .await?;

        Ok(result.rows_affected)
    }
}
