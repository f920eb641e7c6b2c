//! GitHub REST API client.
//!
//! Thin wrapper over `reqwest` that knows the handful of endpoints the App
//! uses. Callers pass the bearer credential explicitly: the app assertion for
//! `/app/...` endpoints, an installation token for everything else.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument, warn};

use crate::error::AppError;
use crate::models::github::CreateCommentRequest;
use crate::models::{AccessTokenResponse, GitHubCollaborator, GitHubInstallation, GitHubRepository};

/// HTTP connect timeout for GitHub API calls.
const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// HTTP total timeout for GitHub API calls.
const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = "pr-roast-server";
const API_VERSION: &str = "2022-11-28";
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const DIFF_MEDIA_TYPE: &str = "application/vnd.github.v3.diff";
const COLLABORATORS_PER_PAGE: usize = 100;
const MAX_COLLABORATOR_PAGES: usize = 50;
/// Longest upstream error body kept in an error message.
const MAX_ERROR_BODY: usize = 512;

/// Failures talking to GitHub or minting credentials for it.
#[derive(Debug, thiserror::Error)]
pub enum GitHubError {
    #[error("GitHub App is not configured: {0}")]
    Configuration(String),

    #[error("Failed to sign app assertion: {0}")]
    Signing(String),

    #[error("{0} not found on GitHub")]
    NotFound(String),

    #[error("GitHub returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("GitHub request failed: {0}")]
    Network(#[from] reqwest::Error),
}

impl From<GitHubError> for AppError {
    fn from(err: GitHubError) -> Self {
        match err {
            GitHubError::Configuration(_) | GitHubError::Signing(_) => {
                AppError::Configuration(err.to_string())
            }
            GitHubError::NotFound(what) => AppError::NotFound(what),
            GitHubError::Upstream { .. } | GitHubError::Network(_) => {
                AppError::Upstream(err.to_string())
            }
        }
    }
}

/// GitHub REST client.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
}

impl GitHubClient {
    /// Build a client for an API base URL such as `https://api.github.com`.
    pub fn new(api_url: &str) -> Result<Self, GitHubError> {
        let http = reqwest::Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(HTTP_REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, method: Method, path: &str, bearer: &SecretString) -> RequestBuilder {
        self.request_as(method, path, bearer, JSON_MEDIA_TYPE)
    }

    fn request_as(
        &self,
        method: Method,
        path: &str,
        bearer: &SecretString,
        accept: &str,
    ) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.api_url, path))
            .header("Authorization", format!("Bearer {}", bearer.expose_secret()))
            .header("Accept", accept)
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    /// Exchange an app assertion for an installation access token.
    #[instrument(skip(self, assertion))]
    pub async fn create_installation_token(
        &self,
        assertion: &SecretString,
        installation_id: i64,
    ) -> Result<AccessTokenResponse, GitHubError> {
        let path = format!("/app/installations/{}/access_tokens", installation_id);
        let response = self
            .request(Method::POST, &path, assertion)
            .send()
            .await?;
        let response = ensure_success(response, || format!("Installation {}", installation_id))
            .await?;

        Ok(response.json().await?)
    }

    /// Look up an installation with the app assertion.
    #[instrument(skip(self, assertion))]
    pub async fn get_installation(
        &self,
        assertion: &SecretString,
        installation_id: i64,
    ) -> Result<GitHubInstallation, GitHubError> {
        let path = format!("/app/installations/{}", installation_id);
        let response = self.request(Method::GET, &path, assertion).send().await?;
        let response = ensure_success(response, || format!("Installation {}", installation_id))
            .await?;

        Ok(response.json().await?)
    }

    /// Fetch a repository by its numeric id.
    #[instrument(skip(self, token))]
    pub async fn get_repository(
        &self,
        token: &SecretString,
        repository_id: i64,
    ) -> Result<GitHubRepository, GitHubError> {
        let path = format!("/repositories/{}", repository_id);
        let response = self.request(Method::GET, &path, token).send().await?;
        let response =
            ensure_success(response, || format!("Repository {}", repository_id)).await?;

        Ok(response.json().await?)
    }

    /// List every collaborator of a repository, following pages.
    ///
    /// Stops after `MAX_COLLABORATOR_PAGES` full pages and logs a warning;
    /// the returned list is then partial.
    #[instrument(skip(self, token))]
    pub async fn list_collaborators(
        &self,
        token: &SecretString,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<GitHubCollaborator>, GitHubError> {
        let mut collaborators = Vec::new();
        let mut complete = false;

        for page in 1..=MAX_COLLABORATOR_PAGES {
            let path = format!(
                "/repos/{}/{}/collaborators?per_page={}&page={}",
                urlencoding::encode(owner),
                urlencoding::encode(repo),
                COLLABORATORS_PER_PAGE,
                page
            );
            let response = self.request(Method::GET, &path, token).send().await?;
            let response =
                ensure_success(response, || format!("Repository {}/{}", owner, repo)).await?;
            let batch: Vec<GitHubCollaborator> = response.json().await?;
            let last_page = batch.len() < COLLABORATORS_PER_PAGE;
            collaborators.extend(batch);
            if last_page {
                complete = true;
                break;
            }
        }

        if !complete {
            warn!(
                owner,
                repo,
                pages = MAX_COLLABORATOR_PAGES,
                count = collaborators.len(),
                "Collaborator page limit reached, remaining collaborators not mirrored"
            );
        }

        debug!(owner, repo, count = collaborators.len(), "Listed collaborators");
        Ok(collaborators)
    }

    /// Fetch the unified diff of a pull request.
    #[instrument(skip(self, token))]
    pub async fn get_pull_request_diff(
        &self,
        token: &SecretString,
        owner: &str,
        repo: &str,
        number: i32,
    ) -> Result<String, GitHubError> {
        let path = format!(
            "/repos/{}/{}/pulls/{}",
            urlencoding::encode(owner),
            urlencoding::encode(repo),
            number
        );
        let response = self
            .request_as(Method::GET, &path, token, DIFF_MEDIA_TYPE)
            .send()
            .await?;
        let response =
            ensure_success(response, || format!("Pull request {}/{}#{}", owner, repo, number))
                .await?;

        Ok(response.text().await?)
    }

    /// Post a comment on an issue or pull request.
    #[instrument(skip(self, token, body))]
    pub async fn create_issue_comment(
        &self,
        token: &SecretString,
        owner: &str,
        repo: &str,
        number: i32,
        body: &str,
    ) -> Result<(), GitHubError> {
        let path = format!(
            "/repos/{}/{}/issues/{}/comments",
            urlencoding::encode(owner),
            urlencoding::encode(repo),
            number
        );
        let response = self
            .request(Method::POST, &path, token)
            .json(&CreateCommentRequest { body })
            .send()
            .await?;
        ensure_success(response, || format!("Issue {}/{}#{}", owner, repo, number)).await?;

        Ok(())
    }
}

/// Turn a non-2xx response into a `GitHubError`.
async fn ensure_success(
    response: Response,
    what: impl FnOnce() -> String,
) -> Result<Response, GitHubError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::NOT_FOUND {
        return Err(GitHubError::NotFound(what()));
    }

    let mut message = response.text().await.unwrap_or_default();
    if message.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
    }

    Err(GitHubError::Upstream {
        status: status.as_u16(),
        message,
    })
}
