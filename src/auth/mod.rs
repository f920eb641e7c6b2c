//! Session cookies and shared-secret checks.
//!
//! The `auth` cookie carries an HS256 JWT identifying a local account. The
//! migration endpoint is guarded by a static secret compared in constant time.

mod extractor;

use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

use crate::config::SessionSettings;
use crate::entity::account;
use crate::error::{AppError, AppResult};
use crate::models::SessionClaims;

pub use extractor::SessionAuth;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "auth";
/// Session JWT issuer.
pub const SESSION_ISSUER: &str = "pr-roast";

/// Sign a session token for an account.
pub fn issue_session_token(
    account: &account::Model,
    settings: &SessionSettings,
) -> AppResult<String> {
    let now = chrono::Utc::now();
    let exp = now + chrono::Duration::seconds(settings.ttl_secs as i64);

    let claims = SessionClaims {
        sub: account.id.to_string(),
        iss: SESSION_ISSUER.to_string(),
        exp: exp.timestamp() as usize,
        iat: now.timestamp() as usize,
        account_id: account.id,
        email: account.email.clone(),
        name: account.name.clone(),
    };

    let key = EncodingKey::from_secret(settings.secret.expose_secret().as_bytes());
    encode(&Header::new(Algorithm::HS256), &claims, &key)
        .map_err(|e| AppError::Configuration(format!("Failed to sign session token: {}", e)))
}

/// Verify a session token and return its claims.
pub fn verify_session_token(token: &str, secret: &SecretString) -> AppResult<SessionClaims> {
    let key = DecodingKey::from_secret(secret.expose_secret().as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[SESSION_ISSUER]);
    validation.validate_aud = false;

    let token_data = decode::<SessionClaims>(token, &key, &validation)
        .map_err(|e| AppError::Unauthorized(format!("Invalid session token: {}", e)))?;

    Ok(token_data.claims)
}

/// Build the `auth` cookie holding a session token.
pub fn session_cookie(token: String, ttl_secs: u64) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(true);
    cookie.set_max_age(CookieDuration::seconds(ttl_secs as i64));
    cookie
}

/// Build an expired `auth` cookie that clears the session.
pub fn clear_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(true);
    cookie.set_max_age(CookieDuration::ZERO);
    cookie
}

/// Wrapper for the migration secret.
///
/// `Debug` never prints the value; comparisons run in constant time.
#[derive(Clone)]
pub struct MigrationSecret(Option<SecretString>);

impl MigrationSecret {
    pub fn new(secret: Option<SecretString>) -> Self {
        Self(secret)
    }

    /// Compare a provided value with the stored secret.
    ///
    /// Always false when no secret is configured.
    pub fn verify(&self, provided: &str) -> bool {
        match &self.0 {
            Some(secret) => secret
                .expose_secret()
                .as_bytes()
                .ct_eq(provided.as_bytes())
                .into(),
            None => false,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.0.is_some()
    }
}

impl std::fmt::Debug for MigrationSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(_) => write!(f, "MigrationSecret([REDACTED])"),
            None => write!(f, "MigrationSecret(None)"),
        }
    }
}
