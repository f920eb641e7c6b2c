//! Database queries for generated reviews.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::entity::review::{self, ActiveModel, Entity as Review};
use crate::error::{AppError, AppResult};

use super::DbPool;

impl DbPool {
    /// Store a new open review.
    pub async fn insert_review(
        &self,
        repository_id: i64,
        pull_request_number: i32,
        content: &str,
    ) -> AppResult<review::Model> {
        let now = Utc::now();

        let model = ActiveModel {
            repository_id: Set(repository_id),
            pull_request_number: Set(pull_request_number),
            content: Set(content.to_string()),
            is_open: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model.insert(self.connection()).await.map_err(|e| {
            AppError::Database(format!(
                "Failed to insert review for {}#{}: {}",
                repository_id, pull_request_number, e
            ))
        })?;

        Ok(result)
    }

    /// Most recent review of a pull request.
    pub async fn find_latest_review(
        &self,
        repository_id: i64,
        pull_request_number: i32,
    ) -> AppResult<Option<review::Model>> {
        let result = Review::find()
            .filter(review::Column::RepositoryId.eq(repository_id))
            .filter(review::Column::PullRequestNumber.eq(pull_request_number))
            .order_by_desc(review::Column::Id)
            .one(self.connection())
            .await?;

        Ok(result)
    }

    /// Overwrite the content of an existing review and reopen it.
    pub async fn replace_review_content(
        &self,
        existing: review::Model,
        content: &str,
    ) -> AppResult<review::Model> {
        let id = existing.id;
        let mut active: ActiveModel = existing.into();
        active.content = Set(content.to_string());
        active.is_open = Set(true);
        active.updated_at = Set(Utc::now());

        let updated = active
            .update(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to update review {}: {}", id, e)))?;

        Ok(updated)
    }

    /// All reviews of a repository, newest first.
    pub async fn list_reviews(&self, repository_id: i64) -> AppResult<Vec<review::Model>> {
        let result = Review::find()
            .filter(review::Column::RepositoryId.eq(repository_id))
            .order_by_desc(review::Column::CreatedAt)
            .order_by_desc(review::Column::Id)
            .all(self.connection())
            .await?;

        Ok(result)
    }
}
