//! Mock GitHub REST API and generation API for E2E tests.
//!
//! Starts an in-process HTTP server on an ephemeral port serving the handful
//! of endpoints the App calls, and records what it was asked to do.

use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use rsa::RsaPrivateKey;
use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::pkcs8::LineEnding;
use rsa::rand_core::OsRng;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::{Arc, Mutex, OnceLock};

/// Client id the test App signs its assertions with.
pub const TEST_CLIENT_ID: &str = "Iv1.e2e-test-app";
/// Installation id the mock refuses to mint tokens for.
pub const SUSPENDED_INSTALLATION: i64 = 403_403;
/// Diff served for every pull request.
pub const TEST_DIFF: &str = "diff --git a/src/lib.rs b/src/lib.rs\n+pub fn answer() -> u32 { 42 }\n";

/// RSA key pair for app assertions, generated once per test binary.
pub struct AppKeys {
    pub private_pem: String,
    pub public_pem: String,
}

pub fn app_keys() -> &'static AppKeys {
    static KEYS: OnceLock<AppKeys> = OnceLock::new();
    KEYS.get_or_init(|| {
        let private_key = RsaPrivateKey::new(&mut OsRng, 2048).expect("failed to generate RSA key");
        let private_pem = private_key
            .to_pkcs1_pem(LineEnding::LF)
            .expect("failed to encode private key")
            .to_string();
        let public_pem = private_key
            .to_public_key()
            .to_pkcs1_pem(LineEnding::LF)
            .expect("failed to encode public key");
        AppKeys {
            private_pem,
            public_pem,
        }
    })
}

/// A comment the App posted.
#[derive(Debug, Clone)]
pub struct PostedComment {
    pub repo: String,
    pub number: i32,
    pub body: String,
}

/// Shared state for the mock server.
#[derive(Default)]
pub struct MockState {
    installations: HashMap<i64, Value>,
    repositories: HashMap<i64, Value>,
    collaborators: HashMap<String, Vec<Value>>,
    pub review_text: String,
    pub fail_comments: bool,
    pub token_requests: Vec<i64>,
    pub diff_requests: usize,
    pub generation_requests: Vec<Value>,
    pub comments: Vec<PostedComment>,
}

#[derive(Deserialize)]
struct PageQuery {
    page: Option<usize>,
    per_page: Option<usize>,
}

#[derive(Deserialize)]
struct AssertionClaims {
    iss: String,
}

type SharedState = web::Data<Arc<Mutex<MockState>>>;

fn bearer(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn is_valid_assertion(req: &HttpRequest) -> bool {
    let Some(token) = bearer(req) else {
        return false;
    };
    let key = DecodingKey::from_rsa_pem(app_keys().public_pem.as_bytes())
        .expect("invalid public key");
    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_issuer(&[TEST_CLIENT_ID]);
    validation.validate_aud = false;
    jsonwebtoken::decode::<AssertionClaims>(token, &key, &validation)
        .map(|data| data.claims.iss == TEST_CLIENT_ID)
        .unwrap_or(false)
}

fn is_installation_token(req: &HttpRequest) -> bool {
    bearer(req).is_some_and(|t| t.starts_with("ghs_"))
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "message": "Not Found" }))
}

async fn create_access_token(
    req: HttpRequest,
    path: web::Path<i64>,
    state: SharedState,
) -> HttpResponse {
    if !is_valid_assertion(&req) {
        return HttpResponse::Unauthorized().json(json!({ "message": "Bad credentials" }));
    }
    let installation_id = path.into_inner();
    let mut state = state.lock().unwrap();
    state.token_requests.push(installation_id);
    if installation_id == SUSPENDED_INSTALLATION {
        return HttpResponse::Forbidden()
            .json(json!({ "message": "This installation has been suspended" }));
    }

    HttpResponse::Created().json(json!({
        "token": format!("ghs_test_{}", installation_id),
        "expires_at": (Utc::now() + Duration::hours(1)).to_rfc3339(),
    }))
}

async fn get_installation(
    req: HttpRequest,
    path: web::Path<i64>,
    state: SharedState,
) -> HttpResponse {
    if !is_valid_assertion(&req) {
        return HttpResponse::Unauthorized().json(json!({ "message": "Bad credentials" }));
    }
    let state = state.lock().unwrap();
    match state.installations.get(&path.into_inner()) {
        Some(installation) => HttpResponse::Ok().json(installation),
        None => not_found(),
    }
}

async fn get_repository(
    req: HttpRequest,
    path: web::Path<i64>,
    state: SharedState,
) -> HttpResponse {
    if !is_installation_token(&req) {
        return HttpResponse::Unauthorized().finish();
    }
    let state = state.lock().unwrap();
    match state.repositories.get(&path.into_inner()) {
        Some(repo) => HttpResponse::Ok().json(repo),
        None => not_found(),
    }
}

async fn list_collaborators(
    req: HttpRequest,
    path: web::Path<(String, String)>,
    query: web::Query<PageQuery>,
    state: SharedState,
) -> HttpResponse {
    if !is_installation_token(&req) {
        return HttpResponse::Unauthorized().finish();
    }
    let (owner, repo) = path.into_inner();
    let per_page = query.per_page.unwrap_or(30);
    let page = query.page.unwrap_or(1).max(1);

    let state = state.lock().unwrap();
    let Some(all) = state.collaborators.get(&format!("{}/{}", owner, repo)) else {
        return not_found();
    };
    let items: Vec<&Value> = all.iter().skip((page - 1) * per_page).take(per_page).collect();
    HttpResponse::Ok().json(items)
}

async fn get_pull_request(
    req: HttpRequest,
    state: SharedState,
) -> HttpResponse {
    if !is_installation_token(&req) {
        return HttpResponse::Unauthorized().finish();
    }
    let accept = req
        .headers()
        .get("Accept")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if accept != "application/vnd.github.v3.diff" {
        return HttpResponse::UnsupportedMediaType().finish();
    }

    state.lock().unwrap().diff_requests += 1;
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(TEST_DIFF)
}

async fn create_comment(
    req: HttpRequest,
    path: web::Path<(String, String, i32)>,
    body: web::Json<Value>,
    state: SharedState,
) -> HttpResponse {
    if !is_installation_token(&req) {
        return HttpResponse::Unauthorized().finish();
    }
    let (owner, repo, number) = path.into_inner();
    let mut state = state.lock().unwrap();
    if state.fail_comments {
        return HttpResponse::BadGateway().json(json!({ "message": "Server Error" }));
    }

    state.comments.push(PostedComment {
        repo: format!("{}/{}", owner, repo),
        number,
        body: body["body"].as_str().unwrap_or_default().to_string(),
    });
    HttpResponse::Created().json(json!({ "id": state.comments.len() }))
}

async fn generate_content(
    req: HttpRequest,
    body: web::Json<Value>,
    state: SharedState,
) -> HttpResponse {
    if req.headers().get("x-goog-api-key").is_none() {
        return HttpResponse::Forbidden().json(json!({ "error": { "message": "API key missing" } }));
    }
    let mut state = state.lock().unwrap();
    state.generation_requests.push(body.into_inner());

    HttpResponse::Ok().json(json!({
        "candidates": [
            { "content": { "role": "model", "parts": [{ "text": state.review_text.clone() }] } }
        ]
    }))
}

/// Mock GitHub + generation server.
pub struct MockGitHub {
    pub url: String,
    pub state: Arc<Mutex<MockState>>,
}

impl MockGitHub {
    /// Start the mock on an ephemeral port.
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(MockState {
            review_text: "Bold of you to call this a function.".to_string(),
            ..Default::default()
        }));

        let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind");
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{}", port);

        let state_data = state.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(state_data.clone()))
                .route(
                    "/app/installations/{id}/access_tokens",
                    web::post().to(create_access_token),
                )
                .route("/app/installations/{id}", web::get().to(get_installation))
                .route("/repositories/{id}", web::get().to(get_repository))
                .route(
                    "/repos/{owner}/{repo}/collaborators",
                    web::get().to(list_collaborators),
                )
                .route(
                    "/repos/{owner}/{repo}/pulls/{number}",
                    web::get().to(get_pull_request),
                )
                .route(
                    "/repos/{owner}/{repo}/issues/{number}/comments",
                    web::post().to(create_comment),
                )
                .route("/v1beta/models/{model}", web::post().to(generate_content))
        })
        .workers(1)
        .listen(listener)
        .expect("failed to listen")
        .disable_signals()
        .run();

        // Lives as long as the test runtime
        tokio::spawn(server);

        MockGitHub { url, state }
    }

    pub fn add_installation(&self, installation_id: i64, account_id: i64, login: &str) {
        self.state.lock().unwrap().installations.insert(
            installation_id,
            json!({ "id": installation_id, "account": { "id": account_id, "login": login } }),
        );
    }

    /// Serve a repository and its collaborators as `(id, login, role)`.
    pub fn add_repository(
        &self,
        id: i64,
        owner_id: i64,
        owner: &str,
        name: &str,
        collaborators: &[(i64, &str, &str)],
    ) {
        let mut state = self.state.lock().unwrap();
        state.repositories.insert(
            id,
            json!({
                "id": id,
                "name": name,
                "full_name": format!("{}/{}", owner, name),
                "owner": { "id": owner_id, "login": owner }
            }),
        );
        state.collaborators.insert(
            format!("{}/{}", owner, name),
            collaborators
                .iter()
                .map(|(id, login, role)| json!({ "id": id, "login": login, "role_name": role }))
                .collect(),
        );
    }

    pub fn set_review_text(&self, text: &str) {
        self.state.lock().unwrap().review_text = text.to_string();
    }

    pub fn fail_comments(&self) {
        self.state.lock().unwrap().fail_comments = true;
    }

    pub fn token_requests(&self) -> Vec<i64> {
        self.state.lock().unwrap().token_requests.clone()
    }

    pub fn comments(&self) -> Vec<PostedComment> {
        self.state.lock().unwrap().comments.clone()
    }

    pub fn generation_requests(&self) -> Vec<Value> {
        self.state.lock().unwrap().generation_requests.clone()
    }

    pub fn diff_requests(&self) -> usize {
        self.state.lock().unwrap().diff_requests
    }
}
