//! Business logic services.

pub mod access;
pub mod credentials;
pub mod generation;
pub mod github;
pub mod password;
pub mod review;
pub mod signature;
pub mod sync;
pub mod webhook;

pub use credentials::CredentialProvider;
pub use generation::GenerationClient;
pub use github::GitHubClient;
pub use review::ReviewGenerator;
pub use signature::SignatureVerifier;
pub use sync::SyncEngine;
pub use webhook::WebhookDispatcher;

use crate::auth::MigrationSecret;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::AppResult;

/// Long-lived services shared by every worker.
///
/// Built once at startup. Each field is cheap to clone.
#[derive(Clone)]
pub struct AppServices {
    pub credentials: CredentialProvider,
    pub verifier: SignatureVerifier,
    pub dispatcher: WebhookDispatcher,
    pub migration_secret: MigrationSecret,
}

impl AppServices {
    pub fn build(config: &Config, db: DbPool) -> AppResult<Self> {
        let github = GitHubClient::new(&config.github.api_url)?;
        let generation = GenerationClient::new(&config.generation)?;
        let credentials = CredentialProvider::new(&config.github, github);

        let sync = SyncEngine::new(db.clone(), credentials.clone());
        let reviews = ReviewGenerator::new(
            db,
            credentials.clone(),
            generation,
            config.generation.review_mode,
        );

        Ok(Self {
            credentials,
            verifier: SignatureVerifier::new(config.github.webhook_secret.clone()),
            dispatcher: WebhookDispatcher::new(sync, reviews),
            migration_secret: MigrationSecret::new(config.migration_secret.clone()),
        })
    }

    /// Register every service as actix app data.
    pub fn register(&self, cfg: &mut actix_web::web::ServiceConfig) {
        use actix_web::web::Data;

        cfg.app_data(Data::new(self.credentials.clone()))
            .app_data(Data::new(self.verifier.clone()))
            .app_data(Data::new(self.dispatcher.clone()))
            .app_data(Data::new(self.migration_secret.clone()));
    }
}

