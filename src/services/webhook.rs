//! Routes parsed webhook deliveries to their handlers.

use tracing::info;

use super::review::ReviewGenerator;
use super::sync::SyncEngine;
use crate::error::AppResult;
use crate::models::WebhookEvent;

/// Dispatches each event kind to the sync engine or the review generator.
#[derive(Clone)]
pub struct WebhookDispatcher {
    sync: SyncEngine,
    reviews: ReviewGenerator,
}

impl WebhookDispatcher {
    pub fn new(sync: SyncEngine, reviews: ReviewGenerator) -> Self {
        Self { sync, reviews }
    }

    pub async fn dispatch(&self, event: &WebhookEvent) -> AppResult<()> {
        info!(event = event.kind(), action = event.action(), "Dispatching webhook");

        match event {
            WebhookEvent::PullRequest(e) => {
                self.reviews.handle_pull_request(e).await?;
            }
            WebhookEvent::Installation(e) => self.sync.handle_installation(e).await?,
            WebhookEvent::InstallationTarget(e) => self.sync.handle_installation_target(e).await?,
            WebhookEvent::Repository(e) => self.sync.handle_repository(e).await?,
            WebhookEvent::Member(e) => self.sync.handle_member(e).await?,
            WebhookEvent::InstallationRepositories(e) => {
                self.sync.handle_installation_repositories(e).await?
            }
        }

        Ok(())
    }
}
