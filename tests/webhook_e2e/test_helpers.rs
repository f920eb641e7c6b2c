//! Shared test helpers for webhook E2E tests.

use actix_web::cookie::Cookie;
use actix_web::{App, dev::ServiceResponse, test, web};
use pr_roast_lib::api;
use pr_roast_lib::auth::{SESSION_COOKIE, issue_session_token};
use pr_roast_lib::config::{
    Config, DatabaseSettings, Environment, GenerationSettings, GitHubAppSettings, ReviewMode,
    SessionSettings, defaults,
};
use pr_roast_lib::db::DbPool;
use pr_roast_lib::db::repositories::RepositoryRecord;
use pr_roast_lib::entity::{account, collaborator, repository, review};
use pr_roast_lib::services::AppServices;
use pr_roast_lib::services::password::hash_password;
use pr_roast_lib::services::signature::sign;
use sea_orm::{ConnectOptions, ConnectionTrait, EntityTrait, PaginatorTrait};
use secrecy::SecretString;
use serde_json::Value;

use super::mock_github::{MockGitHub, TEST_CLIENT_ID, app_keys};

pub const TEST_WEBHOOK_SECRET: &str = "e2e-webhook-secret";
pub const TEST_MIGRATION_SECRET: &str = "e2e-migration-secret";
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// SQLite rendition of the four tables, with the same foreign keys and
/// unique indexes as the migrations.
const SCHEMA: &[&str] = &[
    "CREATE TABLE accounts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        name TEXT NOT NULL,
        enabled BOOLEAN NOT NULL DEFAULT 1,
        github_id BIGINT,
        installation_id BIGINT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE UNIQUE INDEX idx_accounts_github_id ON accounts (github_id) WHERE github_id IS NOT NULL",
    "CREATE TABLE repositories (
        id BIGINT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        owner TEXT NOT NULL,
        owner_id BIGINT NOT NULL,
        installation_id BIGINT,
        enabled BOOLEAN NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE collaborators (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        repository_id BIGINT NOT NULL REFERENCES repositories (id) ON DELETE CASCADE,
        github_user_id BIGINT NOT NULL,
        github_login TEXT NOT NULL,
        role TEXT NOT NULL,
        account_id BIGINT REFERENCES accounts (id) ON DELETE SET NULL,
        is_registered_user BOOLEAN NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (repository_id, github_user_id)
    )",
    "CREATE TABLE reviews (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        repository_id BIGINT NOT NULL REFERENCES repositories (id) ON DELETE CASCADE,
        pull_request_number INTEGER NOT NULL,
        content TEXT NOT NULL,
        is_open BOOLEAN NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
];

/// Create a fresh in-memory database with the schema applied.
///
/// A single connection keeps every query on the same in-memory database.
pub async fn create_test_pool() -> DbPool {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let pool = DbPool::connect(options)
        .await
        .expect("Failed to open in-memory database");

    for statement in SCHEMA {
        pool.connection()
            .execute_unprepared(statement)
            .await
            .expect("Failed to create schema");
    }

    pool
}

/// Configuration pointing both upstream APIs at the mock.
pub fn test_config(mock_url: &str, review_mode: ReviewMode) -> Config {
    Config {
        environment: Environment::Development,
        host: "127.0.0.1".to_string(),
        port: 0,
        database: DatabaseSettings {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        github: GitHubAppSettings {
            client_id: Some(TEST_CLIENT_ID.to_string()),
            private_key: Some(SecretString::from(app_keys().private_pem.clone())),
            webhook_secret: Some(SecretString::from(TEST_WEBHOOK_SECRET.to_string())),
            api_url: mock_url.to_string(),
        },
        generation: GenerationSettings {
            api_key: Some(SecretString::from("e2e-generation-key".to_string())),
            api_url: mock_url.to_string(),
            model: defaults::GENERATION_MODEL.to_string(),
            review_mode,
        },
        session: SessionSettings {
            secret: SecretString::from("e2e-session-secret".to_string()),
            ttl_secs: defaults::SESSION_TTL_SECS,
        },
        migration_secret: Some(SecretString::from(TEST_MIGRATION_SECRET.to_string())),
        cors_origin: None,
    }
}

/// Everything a test needs: mock upstream, database and configuration.
pub struct TestContext {
    pub mock: MockGitHub,
    pub pool: DbPool,
    pub config: Config,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_mode(ReviewMode::Append).await
    }

    pub async fn with_mode(review_mode: ReviewMode) -> Self {
        let mock = MockGitHub::start().await;
        let pool = create_test_pool().await;
        let config = test_config(&mock.url, review_mode);
        Self { mock, pool, config }
    }

    /// Issue a session cookie for an account.
    pub fn session_cookie(&self, account: &account::Model) -> Cookie<'static> {
        let token = issue_session_token(account, &self.config.session)
            .expect("Failed to issue session token");
        Cookie::new(SESSION_COOKIE, token)
    }
}

/// Create the app wired the same way as the server binary.
pub async fn create_test_app(
    ctx: &TestContext,
) -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = ServiceResponse,
    Error = actix_web::Error,
> {
    let services =
        AppServices::build(&ctx.config, ctx.pool.clone()).expect("Failed to build services");

    test::init_service(
        App::new()
            .app_data(web::Data::new(ctx.pool.clone()))
            .app_data(web::Data::new(ctx.config.clone()))
            .configure(|cfg| services.register(cfg))
            .service(web::scope("/api/v1").configure(api::configure_api)),
    )
    .await
}

/// Deliver a signed webhook and return status and body text.
pub async fn send_webhook<S>(app: &S, event: &str, payload: &Value) -> (u16, String)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let body = serde_json::to_vec(payload).expect("Failed to serialize payload");
    let signature = sign(TEST_WEBHOOK_SECRET.as_bytes(), &body);

    let req = test::TestRequest::post()
        .uri("/api/v1/github/webhook")
        .insert_header(("X-GitHub-Event", event))
        .insert_header(("X-Hub-Signature-256", signature))
        .insert_header(("X-GitHub-Delivery", "e2e-delivery"))
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body)
        .to_request();

    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    let body = test::read_body(resp).await;
    (status, String::from_utf8_lossy(&body).to_string())
}

/// GET an endpoint with an optional session cookie.
pub async fn get_json<S>(app: &S, uri: &str, cookie: Option<Cookie<'static>>) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let mut req = test::TestRequest::get().uri(uri);
    if let Some(cookie) = cookie {
        req = req.cookie(cookie);
    }

    let resp = test::call_service(app, req.to_request()).await;
    let status = resp.status().as_u16();
    let body = test::read_body(resp).await;
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

/// Create an enabled account, optionally linked to a GitHub identity.
pub async fn seed_account(
    pool: &DbPool,
    email: &str,
    github: Option<(i64, i64)>,
) -> account::Model {
    let hash = hash_password(TEST_PASSWORD).expect("Failed to hash password");
    let account = pool
        .create_account(email, "Test User", &hash)
        .await
        .expect("Failed to create account");

    match github {
        Some((github_id, installation_id)) => pool
            .link_account_installation(account.id, github_id, installation_id)
            .await
            .expect("Failed to link account"),
        None => account,
    }
}

/// Insert an enabled repository directly.
pub async fn seed_repository(
    pool: &DbPool,
    id: i64,
    owner: &str,
    owner_id: i64,
    installation_id: i64,
) -> repository::Model {
    pool.insert_repository(&RepositoryRecord {
        id,
        name: format!("repo-{}", id),
        owner: owner.to_string(),
        owner_id,
        installation_id: Some(installation_id),
    })
    .await
    .expect("Failed to insert repository")
}

pub async fn count_repositories(pool: &DbPool) -> u64 {
    repository::Entity::find()
        .count(pool.connection())
        .await
        .expect("Failed to count repositories")
}

pub async fn count_collaborators(pool: &DbPool) -> u64 {
    collaborator::Entity::find()
        .count(pool.connection())
        .await
        .expect("Failed to count collaborators")
}

pub async fn count_reviews(pool: &DbPool) -> u64 {
    review::Entity::find()
        .count(pool.connection())
        .await
        .expect("Failed to count reviews")
}

/// Installation payload listing repositories by `(id, name)`.
pub fn installation_payload(action: &str, installation_id: i64, repos: &[(i64, &str)]) -> Value {
    serde_json::json!({
        "action": action,
        "installation": {
            "id": installation_id,
            "account": { "id": 9001, "login": "acme" }
        },
        "repositories": repos
            .iter()
            .map(|(id, name)| serde_json::json!({
                "id": id,
                "name": name,
                "full_name": format!("acme/{}", name)
            }))
            .collect::<Vec<_>>(),
        "sender": { "id": 9001, "login": "acme" }
    })
}

/// Repository payload with the given action.
pub fn repository_payload(
    action: &str,
    id: i64,
    name: &str,
    owner: &str,
    owner_id: i64,
    installation_id: i64,
) -> Value {
    serde_json::json!({
        "action": action,
        "repository": {
            "id": id,
            "name": name,
            "full_name": format!("{}/{}", owner, name),
            "owner": { "id": owner_id, "login": owner }
        },
        "installation": { "id": installation_id }
    })
}

/// Pull request payload with the given action.
pub fn pull_request_payload(
    action: &str,
    repository_id: i64,
    number: i32,
    installation_id: Option<i64>,
) -> Value {
    let mut payload = serde_json::json!({
        "action": action,
        "number": number,
        "pull_request": { "number": number, "title": "Add answer()" },
        "repository": {
            "id": repository_id,
            "name": format!("repo-{}", repository_id),
            "full_name": format!("acme/repo-{}", repository_id),
            "owner": { "id": 9001, "login": "acme" }
        }
    });
    if let Some(id) = installation_id {
        payload["installation"] = serde_json::json!({ "id": id });
    }
    payload
}

/// Member payload with the given action.
pub fn member_payload(
    action: &str,
    repository_id: i64,
    member_id: i64,
    login: &str,
    changes: Option<Value>,
) -> Value {
    let mut payload = serde_json::json!({
        "action": action,
        "member": { "id": member_id, "login": login },
        "repository": {
            "id": repository_id,
            "name": format!("repo-{}", repository_id),
            "full_name": format!("acme/repo-{}", repository_id),
            "owner": { "id": 9001, "login": "acme" }
        },
        "installation": { "id": 555 }
    });
    if let Some(changes) = changes {
        payload["changes"] = changes;
    }
    payload
}
