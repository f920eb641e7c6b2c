//! Database queries for accounts.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

use crate::entity::account::{self, ActiveModel, Entity as Account};
use crate::error::{AppError, AppResult};

use super::DbPool;

impl DbPool {
    /// Insert a new enabled account.
    pub async fn create_account(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> AppResult<account::Model> {
        let now = Utc::now();

        let model = ActiveModel {
            email: Set(email.to_string()),
            password_hash: Set(password_hash.to_string()),
            name: Set(name.to_string()),
            enabled: Set(true),
            github_id: Set(None),
            installation_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert account: {}", e)))?;

        Ok(result)
    }

    /// Get an account by local id.
    pub async fn find_account_by_id(&self, id: i64) -> AppResult<Option<account::Model>> {
        let result = Account::find_by_id(id).one(self.connection()).await?;
        Ok(result)
    }

    /// Get the enabled account holding an email address.
    pub async fn find_enabled_account_by_email(
        &self,
        email: &str,
    ) -> AppResult<Option<account::Model>> {
        let result = Account::find()
            .filter(account::Column::Email.eq(email))
            .filter(account::Column::Enabled.eq(true))
            .one(self.connection())
            .await?;

        Ok(result)
    }

    /// Get the account linked to a GitHub account id.
    ///
    /// `Ok(None)` means no account is linked; errors are data-layer failures.
    pub async fn find_account_by_github_id(
        &self,
        github_id: i64,
    ) -> AppResult<Option<account::Model>> {
        let result = Account::find()
            .filter(account::Column::GithubId.eq(github_id))
            .one(self.connection())
            .await?;

        Ok(result)
    }

    /// Record the GitHub identity and installation of an account.
    pub async fn link_account_installation(
        &self,
        account_id: i64,
        github_id: i64,
        installation_id: i64,
    ) -> AppResult<account::Model> {
        let existing = self
            .find_account_by_id(account_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Account {}", account_id)))?;

        let mut active: ActiveModel = existing.into();
        active.github_id = Set(Some(github_id));
        active.installation_id = Set(Some(installation_id));
        active.updated_at = Set(Utc::now());

        let updated = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to link account: {}", e)))?;

        Ok(updated)
    }
}
