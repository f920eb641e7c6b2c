//! Liveness and readiness checks.
//!
//! Readiness fails only on the database. Missing App or model credentials are
//! reported but do not fail the check, since each operation that needs one
//! fails on its own.

use actix_web::{HttpResponse, get, web};
use chrono::Utc;
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::config::Config;
use crate::db::DbPool;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: String,
}

/// Which operation credentials are present.
#[derive(Serialize, ToSchema)]
pub struct CredentialStatus {
    /// Client id and private key for app assertions
    github_app: bool,
    webhook_secret: bool,
    generation: bool,
}

impl CredentialStatus {
    fn from_config(config: &Config) -> Self {
        Self {
            github_app: config.github.client_id.is_some() && config.github.private_key.is_some(),
            webhook_secret: config.github.webhook_secret.is_some(),
            generation: config.generation.api_key.is_some(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ReadyResponse {
    status: &'static str,
    database: &'static str,
    credentials: CredentialStatus,
}

/// Liveness check.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Process is up", body = HealthResponse)
    )
)]
#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check.
///
/// 200 once the database answers, with the credential summary attached.
#[utoipa::path(
    get,
    path = "/api/v1/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Database reachable", body = ReadyResponse),
        (status = 503, description = "Database unreachable", body = crate::error::ErrorResponse)
    )
)]
#[get("/ready")]
pub async fn ready(pool: web::Data<DbPool>, config: web::Data<Config>) -> HttpResponse {
    if let Err(e) = pool.ping().await {
        warn!("Readiness check failed: {}", e);
        return HttpResponse::ServiceUnavailable().json(crate::error::ErrorResponse {
            error: "NOT_READY".to_string(),
            message: "Database connection failed".to_string(),
        });
    }

    HttpResponse::Ok().json(ReadyResponse {
        status: "ready",
        database: "connected",
        credentials: CredentialStatus::from_config(&config),
    })
}

pub fn configure_health_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(ready);
}
