//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::auth::SESSION_COOKIE;
use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "PR Roast Server",
        version = "0.1.0",
        description = "GitHub App backend that mirrors installations and posts generated pull request reviews"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // GitHub
        api::webhook::receive_webhook,
        // Account endpoints
        api::account::signup,
        api::account::login,
        api::account::logout,
        api::account::verify_session,
        api::account::link_installation,
        api::account::list_repositories,
        // Repository endpoints
        api::repositories::get_repository,
        api::repositories::list_collaborators,
        api::repositories::list_reviews,
        // Admin
        api::migrate::run_migrations,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            api::health::CredentialStatus,
            // Account
            models::SignupRequest,
            models::LoginRequest,
            models::LinkInstallationRequest,
            models::AccountResponse,
            models::SessionStatusResponse,
            // Repositories
            models::RepositoryResponse,
            models::CollaboratorResponse,
            models::ReviewResponse,
            models::RepositoryDetailResponse,
            models::RepositoryListResponse,
            models::CollaboratorListResponse,
            models::ReviewListResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "GitHub", description = "GitHub App webhook receiver"),
        (name = "Account", description = "Signup, login and installation linking"),
        (name = "Repositories", description = "Mirrored repositories, collaborators and reviews"),
        (name = "Admin", description = "Operational endpoints")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Add the session cookie security scheme.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Cookie(
                        utoipa::openapi::security::ApiKeyValue::new(SESSION_COOKIE),
                    ),
                ),
            );
        }
    }
}
