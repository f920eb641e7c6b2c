//! Pull-request reviews.
//!
//! On a qualifying pull-request delivery the diff is fetched with an
//! installation token, reviewed by the model, stored, and finally posted as a
//! comment. The stored review is kept even when posting fails.

use tracing::{error, info, instrument, warn};

use super::credentials::CredentialProvider;
use super::generation::GenerationClient;
use crate::config::ReviewMode;
use crate::db::DbPool;
use crate::entity::review;
use crate::error::{AppError, AppResult};
use crate::models::webhook::{PullRequestAction, PullRequestEvent};

/// Generates, stores and posts reviews.
#[derive(Clone)]
pub struct ReviewGenerator {
    db: DbPool,
    credentials: CredentialProvider,
    generation: GenerationClient,
    mode: ReviewMode,
}

impl ReviewGenerator {
    pub fn new(
        db: DbPool,
        credentials: CredentialProvider,
        generation: GenerationClient,
        mode: ReviewMode,
    ) -> Self {
        Self {
            db,
            credentials,
            generation,
            mode,
        }
    }

    /// Review a pull request if the action calls for it.
    ///
    /// Returns the stored review, or `None` when the action is ignored or the
    /// repository is not mirrored. Unmirrored repositories are skipped before
    /// any token, diff or model call is made.
    #[instrument(
        skip(self, event),
        fields(
            repository_id = event.repository.id,
            pull_request = event.number,
            action = %event.action,
        )
    )]
    pub async fn handle_pull_request(
        &self,
        event: &PullRequestEvent,
    ) -> AppResult<Option<review::Model>> {
        match &event.action {
            PullRequestAction::Opened
            | PullRequestAction::Synchronize
            | PullRequestAction::Reopened => {}
            PullRequestAction::Closed | PullRequestAction::Other(_) => {
                info!("Pull request action does not trigger a review");
                return Ok(None);
            }
        }

        let repo = &event.repository;
        let owner = repo.owner.login.as_str();
        let number = event.number;

        if self.db.find_repository(repo.id).await?.is_none() {
            warn!("Pull request on unmirrored repository, skipping review");
            return Ok(None);
        }

        let installation_id = event
            .installation
            .as_ref()
            .map(|i| i.id)
            .ok_or_else(|| {
                AppError::Unauthorized("Pull request event has no installation".to_string())
            })?;

        let token = self
            .credentials
            .installation_token(installation_id)
            .await
            .map_err(|e| {
                AppError::Unauthorized(format!(
                    "No token for installation {}: {}",
                    installation_id, e
                ))
            })?;

        let diff = self
            .credentials
            .github()
            .get_pull_request_diff(&token.token, owner, &repo.name, number)
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to fetch diff: {}", e)))?;

        let content = self.generation.review_diff(&diff).await?;

        let stored = self.store(repo.id, number, &content).await?;
        info!(review_id = stored.id, mode = %self.mode, "Review stored");

        if let Err(e) = self
            .credentials
            .github()
            .create_issue_comment(&token.token, owner, &repo.name, number, &content)
            .await
        {
            error!(review_id = stored.id, "Failed to post review comment: {}", e);
            return Err(AppError::Upstream(format!(
                "Review {} stored but comment failed: {}",
                stored.id, e
            )));
        }

        info!(review_id = stored.id, "Review posted");
        Ok(Some(stored))
    }

    async fn store(
        &self,
        repository_id: i64,
        pull_request_number: i32,
        content: &str,
    ) -> AppResult<review::Model> {
        if self.mode == ReviewMode::ReplaceLatest
            && let Some(latest) = self
                .db
                .find_latest_review(repository_id, pull_request_number)
                .await?
        {
            return self.db.replace_review_content(latest, content).await;
        }

        self.db
            .insert_review(repository_id, pull_request_number, content)
            .await
    }
}
