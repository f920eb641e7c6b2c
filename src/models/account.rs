//! Account and session models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::account;

/// Signup request body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// Login request body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body sent by the frontend after the GitHub App install redirect.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LinkInstallationRequest {
    pub installation_id: i64,
    pub setup_action: String,
}

/// Account info returned to the frontend.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccountResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub github_id: Option<i64>,
    pub installation_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<account::Model> for AccountResponse {
    fn from(m: account::Model) -> Self {
        Self {
            id: m.id,
            email: m.email,
            name: m.name,
            github_id: m.github_id,
            installation_id: m.installation_id,
            created_at: m.created_at,
        }
    }
}

/// Response of the session check endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionStatusResponse {
    #[serde(rename = "loggedIn")]
    pub logged_in: bool,
}

/// Session JWT claims carried by the `auth` cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub iss: String,
    pub exp: usize,
    pub iat: usize,
    pub account_id: i64,
    pub email: String,
    pub name: String,
}
