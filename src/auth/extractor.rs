//! Actix-web extractor for the session cookie.

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, web};
use std::future::{Ready, ready};

use super::{SESSION_COOKIE, verify_session_token};
use crate::config::Config;
use crate::error::AppError;
use crate::models::SessionClaims;

/// Extractor that requires a valid `auth` cookie.
///
/// ```ignore
/// async fn protected_handler(session: SessionAuth) -> impl Responder {
///     // session.claims.account_id is the caller's local account id
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SessionAuth {
    pub claims: SessionClaims,
}

impl SessionAuth {
    pub fn account_id(&self) -> i64 {
        self.claims.account_id
    }
}

impl FromRequest for SessionAuth {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(config) = req.app_data::<web::Data<Config>>() else {
            return ready(Err(AppError::Configuration(
                "Config not registered as app data".to_string(),
            )));
        };

        let Some(cookie) = req.cookie(SESSION_COOKIE) else {
            return ready(Err(AppError::Unauthorized(
                "Missing auth cookie".to_string(),
            )));
        };

        ready(
            verify_session_token(cookie.value(), &config.session.secret)
                .map(|claims| SessionAuth { claims }),
        )
    }
}
