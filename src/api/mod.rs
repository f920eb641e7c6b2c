//! API endpoint modules.

pub mod account;
pub mod health;
pub mod migrate;
pub mod openapi;
pub mod repositories;
pub mod webhook;

pub use account::configure_routes as configure_account_routes;
pub use health::configure_health_routes;
pub use migrate::configure_routes as configure_migrate_routes;
pub use openapi::ApiDoc;
pub use repositories::configure_routes as configure_repository_routes;
pub use webhook::configure_routes as configure_webhook_routes;

use actix_web::web;

/// Register every `/api/v1` route.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_health_routes)
        .configure(configure_webhook_routes)
        .configure(configure_account_routes)
        .configure(configure_repository_routes)
        .configure(configure_migrate_routes);
}
