//! Schema migration endpoint.

use actix_web::{HttpRequest, HttpResponse, web};
use tracing::{info, warn};

use crate::auth::MigrationSecret;
use crate::config::MIGRATION_SECRET_HEADER;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};

/// Apply pending database migrations.
///
/// Guarded by `X-Migration-Secret`. Refuses to run when no secret is configured.
#[utoipa::path(
    post,
    path = "/api/v1/migrate",
    tag = "Admin",
    params(("X-Migration-Secret" = String, Header, description = "Migration secret")),
    responses(
        (status = 200, description = "Migrations applied", body = String),
        (status = 401, description = "Wrong or missing secret", body = crate::error::ErrorResponse),
        (status = 500, description = "Secret not configured or migration failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn run_migrations(
    req: HttpRequest,
    pool: web::Data<DbPool>,
    secret: web::Data<MigrationSecret>,
) -> AppResult<HttpResponse> {
    if !secret.is_configured() {
        return Err(AppError::Configuration(
            "MIGRATION_SECRET is not set".to_string(),
        ));
    }

    let provided = req
        .headers()
        .get(MIGRATION_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !secret.verify(provided) {
        warn!("Migration request rejected: bad secret");
        return Err(AppError::Unauthorized("Invalid migration secret".to_string()));
    }

    pool.run_migrations().await?;
    info!("Migrations applied via API");

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("Migration completed successfully"))
}

/// Configure migration routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/migrate").route(web::post().to(run_migrations)));
}
