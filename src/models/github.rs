//! GitHub REST API shapes shared by webhook payloads and API responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A GitHub user or organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubAccount {
    pub id: i64,
    pub login: String,
}

/// A repository as returned by `GET /repositories/{id}` and embedded in
/// repository-scoped webhook payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubRepository {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub owner: GitHubAccount,
}

/// An entry of `GET /repos/{owner}/{repo}/collaborators`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubCollaborator {
    pub id: i64,
    pub login: String,
    #[serde(default)]
    pub role_name: Option<String>,
}

/// An installation as returned by `GET /app/installations/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubInstallation {
    pub id: i64,
    pub account: GitHubAccount,
}

/// Response of `POST /app/installations/{id}/access_tokens`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Body of `POST /repos/{owner}/{repo}/issues/{number}/comments`.
#[derive(Debug, Serialize)]
pub struct CreateCommentRequest<'a> {
    pub body: &'a str,
}
