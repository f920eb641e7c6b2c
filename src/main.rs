//! PR Roast server - main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use actix_cors::Cors;
use actix_web::{App, HttpServer, http::header, web};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use pr_roast_lib::api::{self, ApiDoc};
use pr_roast_lib::config::{Config, MAX_WEBHOOK_PAYLOAD};
use pr_roast_lib::db::DbPool;
use pr_roast_lib::middleware::RequestLogger;
use pr_roast_lib::services::AppServices;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL and JWT_SECRET_KEY must be set");
            error!("  - In production, values must not match development defaults");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  PR Roast Server");
    info!("  Environment: {}", config.environment);
    info!("  Review mode: {}", config.generation.review_mode);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }
    for (name, missing) in [
        ("GITHUB_APP_CLIENT_ID", config.github.client_id.is_none()),
        ("GITHUB_APP_PRIVATE_KEY", config.github.private_key.is_none()),
        ("GITHUB_WEBHOOK_SECRET", config.github.webhook_secret.is_none()),
        ("AI_API_TOKEN", config.generation.api_key.is_none()),
    ] {
        if missing {
            warn!("{} is not set; operations that need it will fail", name);
        }
    }

    let pool = match DbPool::new(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };
    info!("Database connection established");

    if config.is_development() {
        if let Err(e) = pool.run_migrations().await {
            error!("Failed to run migrations: {}", e);
            std::process::exit(1);
        }
    } else {
        info!("Migrations are applied through POST /api/v1/migrate");
    }

    let services = match AppServices::build(&config, pool.clone()) {
        Ok(services) => services,
        Err(e) => {
            error!("Failed to initialize services: {}", e);
            std::process::exit(1);
        }
    };

    let bind_address = config.bind_address();
    let cors_origin = config.cors_origin.clone();
    let config = web::Data::new(config);

    let worker_count = if config.is_development() {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!(
            "Starting server at http://{} ({} workers)",
            bind_address, cpus
        );
        cpus
    };

    let openapi = ApiDoc::openapi();

    let server = HttpServer::new(move || {
        // The frontend sends the session cookie, so the origin must be explicit
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(3600);
        if let Some(origin) = &cors_origin {
            cors = cors.allowed_origin(origin);
        }

        App::new()
            // Add CORS middleware (must be before other middleware)
            .wrap(cors)
            .wrap(RequestLogger)
            .app_data(web::Data::new(pool.clone()))
            .app_data(config.clone())
            .app_data(web::PayloadConfig::new(MAX_WEBHOOK_PAYLOAD))
            .configure(|cfg| services.register(cfg))
            .service(web::scope("/api/v1").configure(api::configure_api))
            .service(
                SwaggerUi::new("/api/docs/{_:.*}").url("/api/docs/openapi.json", openapi.clone()),
            )
    });

    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await
}
