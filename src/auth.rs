//! OAuth2 access tokens for a Google service account.
//!
//! The account signs a short-lived JWT with its private key and trades it at
//! the account's token endpoint for a bearer token usable against the
//! realtime database REST API.

use crate::error::ConfigError;
use failure::Error;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const SCOPES: &str = "https://www.googleapis.com/auth/firebase.database \
                      https://www.googleapis.com/auth/userinfo.email";
const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME: u64 = 3600;
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// The fields of a service-account key document this service uses.
#[derive(Clone, Deserialize)]
pub struct ServiceAccount {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("client_email", &self.client_email)
            .field("project_id", &self.project_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccount {
    pub fn from_json(json: &str) -> Result<ServiceAccount, ConfigError> {
        let invalid = |reason: String| ConfigError::Invalid {
            name: "FIREBASE_SERVICE_ACCOUNT_JSON",
            reason,
        };
        let account: ServiceAccount =
            serde_json::from_str(json).map_err(|e| invalid(e.to_string()))?;
        if account.client_email.is_empty() {
            return Err(invalid("client_email is empty".to_string()));
        }
        Ok(account)
    }
}

#[derive(Serialize)]
struct GrantClaims<'a> {
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

/// Mints and caches access tokens for one service account.
pub struct TokenSource {
    account: ServiceAccount,
    key: EncodingKey,
    client: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    /// Fails if the account's private key is not a valid RSA PEM.
    pub fn new(account: ServiceAccount, client: reqwest::Client) -> Result<TokenSource, ConfigError> {
        let key = EncodingKey::from_rsa_pem(account.private_key.as_bytes()).map_err(|e| {
            ConfigError::Invalid {
                name: "FIREBASE_SERVICE_ACCOUNT_JSON",
                reason: format!("unusable private_key: {}", e),
            }
        })?;
        info!("Using service account {}", account.client_email);
        Ok(TokenSource {
            account,
            key,
            client,
            cached: Mutex::new(None),
        })
    }

    /// A valid access token, fetching a fresh one when the cached token is
    /// missing or about to expire.
    pub async fn token(&self) -> Result<String, Error> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }
        let response = self.exchange().await?;
        let lifetime = Duration::from_secs(response.expires_in);
        debug!("Fetched access token valid for {:?}", lifetime);
        let token = CachedToken {
            value: response.access_token,
            refresh_at: Instant::now() + lifetime.checked_sub(REFRESH_MARGIN).unwrap_or_default(),
        };
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    fn assertion(&self, now: u64) -> Result<String, Error> {
        let claims = GrantClaims {
            iss: &self.account.client_email,
            scope: SCOPES,
            aud: &self.account.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.account.private_key_id.clone();
        encode(&header, &claims, &self.key).map_err(|e| format_err!("Unable to sign JWT: {}", e))
    }

    async fn exchange(&self) -> Result<TokenResponse, Error> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| format_err!("System clock before epoch: {}", e))?
            .as_secs();
        let assertion = self.assertion(now)?;
        let response = self
            .client
            .post(&self.account.token_uri)
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| format_err!("Error requesting access token: {}", e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format_err!("Token endpoint returned {}: {}", status, body));
        }
        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| format_err!("Unreadable token response: {}", e))
    }
}
