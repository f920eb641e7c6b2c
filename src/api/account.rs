//! Account and session API handlers.

use actix_web::{HttpResponse, web};
use tracing::{info, warn};

use crate::auth::{SessionAuth, clear_session_cookie, issue_session_token, session_cookie};
use crate::config::Config;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{
    AccountResponse, LinkInstallationRequest, LoginRequest, RepositoryListResponse,
    RepositoryResponse, SessionStatusResponse, SignupRequest,
};
use crate::services::CredentialProvider;
use crate::services::password::{hash_password, verify_password};

/// Minimum accepted password length.
const MIN_PASSWORD_LEN: usize = 8;
/// Only installs coming back from the GitHub setup redirect are linked.
const SETUP_ACTION_CREATED: &str = "created";

/// Register a new account.
#[utoipa::path(
    post,
    path = "/api/v1/account/signup",
    tag = "Account",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = AccountResponse),
        (status = 400, description = "Invalid input or email already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn signup(
    pool: web::Data<DbPool>,
    body: web::Json<SignupRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let email = req.email.trim().to_lowercase();
    let name = req.name.trim();

    if email.is_empty() || !email.contains('@') {
        return Err(AppError::InvalidInput("A valid email is required".to_string()));
    }
    if name.is_empty() {
        return Err(AppError::InvalidInput("Name is required".to_string()));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidInput(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    if pool.find_enabled_account_by_email(&email).await?.is_some() {
        return Err(AppError::InvalidInput(
            "An account with this email already exists".to_string(),
        ));
    }

    let password_hash = hash_password(&req.password)?;
    let account = pool.create_account(&email, name, &password_hash).await?;
    info!(account_id = account.id, "Account registered");

    Ok(HttpResponse::Created().json(AccountResponse::from(account)))
}

/// Log in and receive the `auth` session cookie.
#[utoipa::path(
    post,
    path = "/api/v1/account/login",
    tag = "Account",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; session cookie set", body = AccountResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let email = req.email.trim().to_lowercase();

    let Some(account) = pool.find_enabled_account_by_email(&email).await? else {
        return Err(AppError::Unauthorized("Invalid email or password".to_string()));
    };
    if !verify_password(&req.password, &account.password_hash) {
        warn!(account_id = account.id, "Login rejected: wrong password");
        return Err(AppError::Unauthorized("Invalid email or password".to_string()));
    }

    let token = issue_session_token(&account, &config.session)?;
    info!(account_id = account.id, "Account logged in");

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(token, config.session.ttl_secs))
        .json(AccountResponse::from(account)))
}

/// Clear the session cookie.
#[utoipa::path(
    post,
    path = "/api/v1/account/logout",
    tag = "Account",
    responses(
        (status = 204, description = "Session cookie cleared")
    )
)]
pub async fn logout() -> HttpResponse {
    HttpResponse::NoContent()
        .cookie(clear_session_cookie())
        .finish()
}

/// Check whether the caller holds a valid session.
#[utoipa::path(
    get,
    path = "/api/v1/auth/verify",
    tag = "Account",
    responses(
        (status = 200, description = "Session is valid", body = SessionStatusResponse),
        (status = 401, description = "Missing or invalid session", body = crate::error::ErrorResponse)
    ),
    security(("session" = []))
)]
pub async fn verify_session(_session: SessionAuth) -> HttpResponse {
    HttpResponse::Ok().json(SessionStatusResponse { logged_in: true })
}

/// Link the caller's account to a GitHub App installation.
///
/// Called by the frontend after GitHub redirects back from the install flow.
#[utoipa::path(
    post,
    path = "/api/v1/account/installation",
    tag = "Account",
    request_body = LinkInstallationRequest,
    responses(
        (status = 200, description = "Installation linked", body = AccountResponse),
        (status = 400, description = "Unsupported setup action", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing or invalid session", body = crate::error::ErrorResponse),
        (status = 403, description = "GitHub account linked to another account", body = crate::error::ErrorResponse),
        (status = 404, description = "Installation not found", body = crate::error::ErrorResponse)
    ),
    security(("session" = []))
)]
pub async fn link_installation(
    session: SessionAuth,
    pool: web::Data<DbPool>,
    credentials: web::Data<CredentialProvider>,
    body: web::Json<LinkInstallationRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    if req.setup_action != SETUP_ACTION_CREATED {
        return Err(AppError::InvalidInput(format!(
            "Unsupported setup action: {}",
            req.setup_action
        )));
    }

    let assertion = credentials.cached_app_assertion().await?;
    let installation = credentials
        .github()
        .get_installation(&assertion, req.installation_id)
        .await?;

    // One local account per GitHub identity
    if let Some(holder) = pool.find_account_by_github_id(installation.account.id).await?
        && holder.id != session.account_id()
    {
        warn!(
            account_id = session.account_id(),
            holder_id = holder.id,
            github_id = installation.account.id,
            "GitHub account already linked to another account"
        );
        return Err(AppError::Forbidden(
            "GitHub account is already linked to another account".to_string(),
        ));
    }

    let account = pool
        .link_account_installation(
            session.account_id(),
            installation.account.id,
            installation.id,
        )
        .await?;
    let linked = pool
        .link_collaborators_to_account(installation.account.id, account.id)
        .await?;

    info!(
        account_id = account.id,
        github_id = installation.account.id,
        installation_id = installation.id,
        linked_collaborators = linked,
        "Installation linked to account"
    );

    Ok(HttpResponse::Ok().json(AccountResponse::from(account)))
}

/// Repositories the caller owns or collaborates on.
#[utoipa::path(
    get,
    path = "/api/v1/account/repos",
    tag = "Account",
    responses(
        (status = 200, description = "Visible repositories", body = RepositoryListResponse),
        (status = 401, description = "Missing or invalid session", body = crate::error::ErrorResponse)
    ),
    security(("session" = []))
)]
pub async fn list_repositories(
    session: SessionAuth,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let account = pool
        .find_account_by_id(session.account_id())
        .await?
        .filter(|a| a.enabled)
        .ok_or_else(|| AppError::Unauthorized("Account is not active".to_string()))?;

    let owned = match account.github_id {
        Some(github_id) => pool.list_owned_repositories(github_id).await?,
        None => Vec::new(),
    };
    let collaborating = pool.list_collaborating_repositories(account.id).await?;

    Ok(HttpResponse::Ok().json(RepositoryListResponse {
        owned: owned.into_iter().map(RepositoryResponse::from).collect(),
        collaborating: collaborating
            .into_iter()
            .map(RepositoryResponse::from)
            .collect(),
    }))
}

/// Configure account routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/account/signup").route(web::post().to(signup)))
        .service(web::resource("/account/login").route(web::post().to(login)))
        .service(web::resource("/account/logout").route(web::post().to(logout)))
        .service(web::resource("/account/installation").route(web::post().to(link_installation)))
        .service(web::resource("/account/repos").route(web::get().to(list_repositories)))
        .service(web::resource("/auth/verify").route(web::get().to(verify_session)));
}
