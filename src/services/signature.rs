//! Webhook signature verification.
//!
//! GitHub signs each delivery with HMAC-SHA256 over the raw body and sends
//! `sha256=<hex>` in `X-Hub-Signature-256`. Verification must see the bytes
//! exactly as received, before any JSON decoding.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

const PREFIX: &str = "sha256=";

/// Compute the `sha256=<hex>` signature of a payload.
pub fn sign(secret: &[u8], body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(body);
    format!("{}{}", PREFIX, hex::encode(mac.finalize().into_bytes()))
}

/// Verifies webhook deliveries against the shared secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Option<SecretString>,
}

impl SignatureVerifier {
    pub fn new(secret: Option<SecretString>) -> Self {
        Self { secret }
    }

    /// Check the provided signature header against the raw body.
    ///
    /// Returns false when no secret is configured, the header is missing, or
    /// the signature does not match. Never panics.
    pub fn verify(&self, body: &[u8], provided: Option<&str>) -> bool {
        let Some(secret) = &self.secret else {
            warn!("Webhook secret is not configured; rejecting delivery");
            return false;
        };
        let Some(provided) = provided else {
            debug!("Webhook delivery has no signature header");
            return false;
        };

        let expected = sign(secret.expose_secret().as_bytes(), body);
        let matches: bool = expected.as_bytes().ct_eq(provided.as_bytes()).into();
        if !matches {
            warn!("Webhook signature verification failed");
        }
        matches
    }
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("configured", &self.secret.is_some())
            .finish()
    }
}
