//! OAuth2 credentials for the GCS backend.
//!
//! A service-account key is exchanged for short-lived access tokens
//! (JWT bearer grant). Tokens are cached and fetched again shortly before
//! they expire, so a long-running server never uploads with a stale token.

use jsonwebtoken::{encode, get_current_timestamp, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::StorageError;
use crate::config::StorageConfig;

pub const STORAGE_SCOPE: &str = "https://www.googleapis.com/auth/devstorage.read_write";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: u64 = 3600;
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// The fields of a Google service-account JSON key file that are needed to
/// mint access tokens.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

impl ServiceAccountKey {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| {
            StorageError::Auth(format!(
                "invalid service account key {}: {}",
                path.display(),
                e
            ))
        })
    }
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

pub struct ServiceAccountTokens {
    client: Client,
    key: ServiceAccountKey,
    signing_key: EncodingKey,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokens {
    pub fn new(client: Client, key: ServiceAccountKey) -> Result<Self, StorageError> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|e| {
            StorageError::Auth(format!("invalid private key for {}: {}", key.client_email, e))
        })?;

        Ok(Self {
            client,
            key,
            signing_key,
            cached: Mutex::new(None),
        })
    }

    /// Returns a valid access token, fetching a new one when the cached
    /// token is missing or about to expire.
    pub async fn access_token(&self) -> Result<String, StorageError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        let fresh = self.fetch().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    async fn fetch(&self) -> Result<CachedToken, StorageError> {
        let iat = get_current_timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: STORAGE_SCOPE,
            aud: &self.key.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|e| StorageError::Auth(format!("failed to sign token request: {}", e)))?;

        debug!("Requesting access token for {}", self.key.client_email);
        let requested_at = Instant::now();
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            error!("Token request for {} rejected ({}): {}", self.key.client_email, status, body);
            return Err(StorageError::Auth(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(REFRESH_MARGIN);

        Ok(CachedToken {
            value: token.access_token,
            refresh_at: requested_at + lifetime,
        })
    }
}

/// How the GCS backend authenticates its uploads.
pub enum GcsCredentials {
    /// No `Authorization` header (emulators, public test buckets).
    Anonymous,
    /// A pre-issued access token, used as is.
    Static(String),
    ServiceAccount(ServiceAccountTokens),
}

impl GcsCredentials {
    /// A service-account key file wins over a static token.
    pub fn from_config(client: &Client, config: &StorageConfig) -> Result<Self, StorageError> {
        if let Some(path) = &config.credentials_path {
            let key = ServiceAccountKey::from_file(path)?;
            info!("GCS uploads authenticate as {}", key.client_email);
            return Ok(Self::ServiceAccount(ServiceAccountTokens::new(
                client.clone(),
                key,
            )?));
        }

        match &config.access_token {
            Some(token) => Ok(Self::Static(token.clone())),
            None => Ok(Self::Anonymous),
        }
    }

    pub async fn bearer_token(&self) -> Result<Option<String>, StorageError> {
        match self {
            Self::Anonymous => Ok(None),
            Self::Static(token) => Ok(Some(token.clone())),
            Self::ServiceAccount(tokens) => tokens.access_token().await.map(Some),
        }
    }
}
