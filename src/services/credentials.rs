//! GitHub App credentials.
//!
//! Two kinds of credential are involved:
//! - the app assertion, an RS256 JWT signed with the App's private key and
//!   issued by its client id (`iat = now - 60s`, `exp = now + 600s`);
//! - installation tokens, minted by GitHub in exchange for an assertion and
//!   scoped to one installation.
//!
//! `CredentialProvider` is built once at startup and shared by reference.
//! It owns an `AssertionCache` whose mutex covers the whole
//! check-then-regenerate step, so a cache miss under concurrent callers
//! signs exactly one new assertion.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use super::github::{GitHubClient, GitHubError};
use crate::config::GitHubAppSettings;

/// Backdating applied to `iat` to absorb clock skew.
const ASSERTION_BACKDATE_SECS: i64 = 60;
/// Lifetime of an assertion measured from now.
const ASSERTION_LIFETIME_SECS: i64 = 600;
/// A cached assertion is replaced this long before it expires.
const ASSERTION_REFRESH_MARGIN_SECS: i64 = 30;
/// A cached installation token is replaced this long before it expires.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 120;

/// Claims of the app assertion.
#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// A signed app assertion and its expiry.
#[derive(Clone)]
pub struct AppAssertion {
    pub token: SecretString,
    pub expires_at: DateTime<Utc>,
}

impl AppAssertion {
    fn is_fresh(&self, margin: Duration) -> bool {
        Utc::now() + margin < self.expires_at
    }
}

/// An installation access token and its expiry.
#[derive(Clone)]
pub struct InstallationToken {
    pub token: SecretString,
    pub expires_at: DateTime<Utc>,
}

impl InstallationToken {
    fn is_fresh(&self, margin: Duration) -> bool {
        Utc::now() + margin < self.expires_at
    }
}

impl std::fmt::Debug for InstallationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallationToken")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Memoized app assertion guarded by one lock.
#[derive(Default)]
pub struct AssertionCache {
    slot: Mutex<Option<AppAssertion>>,
}

impl AssertionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached assertion while it is fresh, otherwise mint and
    /// store a new one. The lock is held across the mint.
    pub async fn get_or_refresh<F>(
        &self,
        margin: Duration,
        mint: F,
    ) -> Result<AppAssertion, GitHubError>
    where
        F: FnOnce() -> Result<AppAssertion, GitHubError>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(cached) = slot.as_ref()
            && cached.is_fresh(margin)
        {
            return Ok(cached.clone());
        }

        let fresh = mint()?;
        *slot = Some(fresh.clone());
        Ok(fresh)
    }
}

struct ProviderInner {
    client_id: Option<String>,
    private_key: Option<SecretString>,
    github: GitHubClient,
    assertions: AssertionCache,
    installation_tokens: Mutex<HashMap<i64, InstallationToken>>,
}

/// Issues app assertions and installation tokens.
#[derive(Clone)]
pub struct CredentialProvider {
    inner: Arc<ProviderInner>,
}

impl CredentialProvider {
    pub fn new(settings: &GitHubAppSettings, github: GitHubClient) -> Self {
        Self {
            inner: Arc::new(ProviderInner {
                client_id: settings.client_id.clone(),
                private_key: settings.private_key.clone(),
                github,
                assertions: AssertionCache::new(),
                installation_tokens: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The REST client this provider exchanges tokens through.
    pub fn github(&self) -> &GitHubClient {
        &self.inner.github
    }

    /// Sign a fresh app assertion.
    pub fn app_assertion(&self) -> Result<AppAssertion, GitHubError> {
        let client_id = self
            .inner
            .client_id
            .as_deref()
            .ok_or_else(|| GitHubError::Configuration("GITHUB_APP_CLIENT_ID is not set".into()))?;
        let private_key = self.inner.private_key.as_ref().ok_or_else(|| {
            GitHubError::Configuration("GITHUB_APP_PRIVATE_KEY is not set".into())
        })?;

        sign_assertion(client_id, private_key, Utc::now())
    }

    /// Return the memoized assertion, regenerating it when close to expiry.
    pub async fn cached_app_assertion(&self) -> Result<SecretString, GitHubError> {
        let assertion = self
            .inner
            .assertions
            .get_or_refresh(Duration::seconds(ASSERTION_REFRESH_MARGIN_SECS), || {
                debug!("Signing new app assertion");
                self.app_assertion()
            })
            .await?;

        Ok(assertion.token)
    }

    /// Get a token scoped to one installation.
    ///
    /// Tokens are reused until shortly before the expiry GitHub reported and
    /// are never handed out after it.
    #[instrument(skip(self))]
    pub async fn installation_token(
        &self,
        installation_id: i64,
    ) -> Result<InstallationToken, GitHubError> {
        let margin = Duration::seconds(TOKEN_REFRESH_MARGIN_SECS);
        {
            let cache = self.inner.installation_tokens.lock().await;
            if let Some(cached) = cache.get(&installation_id)
                && cached.is_fresh(margin)
            {
                return Ok(cached.clone());
            }
        }

        let assertion = self.cached_app_assertion().await?;
        let response = self
            .inner
            .github
            .create_installation_token(&assertion, installation_id)
            .await?;

        let token = InstallationToken {
            token: SecretString::from(response.token),
            expires_at: response.expires_at,
        };

        let mut cache = self.inner.installation_tokens.lock().await;
        cache.insert(installation_id, token.clone());
        info!(installation_id, expires_at = %token.expires_at, "Installation token issued");

        Ok(token)
    }
}

/// Build and sign assertion claims relative to `now`.
fn sign_assertion(
    client_id: &str,
    private_key: &SecretString,
    now: DateTime<Utc>,
) -> Result<AppAssertion, GitHubError> {
    let expires_at = now + Duration::seconds(ASSERTION_LIFETIME_SECS);
    let claims = AssertionClaims {
        iat: (now - Duration::seconds(ASSERTION_BACKDATE_SECS)).timestamp(),
        exp: expires_at.timestamp(),
        iss: client_id.to_string(),
    };

    // Keys pasted into env files often carry literal "\n" sequences.
    let pem = private_key.expose_secret().replace("\\n", "\n");
    let key = EncodingKey::from_rsa_pem(pem.as_bytes())
        .map_err(|e| GitHubError::Signing(format!("Invalid RSA private key: {}", e)))?;

    let token = encode(&Header::new(Algorithm::RS256), &claims, &key)
        .map_err(|e| GitHubError::Signing(format!("Failed to encode JWT: {}", e)))?;

    Ok(AppAssertion {
        token: SecretString::from(token),
        expires_at,
    })
}
