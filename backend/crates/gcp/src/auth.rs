use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::{read_json, GoogleApiError};

pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Refresh a cached token this long before it expires.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Supplies OAuth2 bearer tokens to the REST clients.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, GoogleApiError>;
}

/// A pre-issued token, for tests and short-lived tooling.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, GoogleApiError> {
        Ok(self.0.clone())
    }
}

/// The fields of a service-account JSON key the token exchange needs.
#[derive(Clone)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    pub token_uri: String,
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

struct CachedToken {
    token: String,
    expires_at: i64,
}

/// Exchanges a signed RS256 assertion for an access token and caches it.
pub struct ServiceAccountTokenSource {
    client: Client,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokenSource {
    pub fn new(client: Client, key: ServiceAccountKey) -> Result<Self, GoogleApiError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| GoogleApiError::Auth(format!("invalid service account key: {e}")))?;
        Ok(Self {
            client,
            key,
            encoding_key,
            cached: Mutex::new(None),
        })
    }

    fn assertion(&self, issued_at: i64) -> Result<String, GoogleApiError> {
        let claims = Claims {
            iss: &self.key.client_email,
            scope: CLOUD_PLATFORM_SCOPE,
            aud: &self.key.token_uri,
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        };
        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| GoogleApiError::Auth(format!("failed to sign assertion: {e}")))
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokenSource {
    async fn access_token(&self) -> Result<String, GoogleApiError> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now().timestamp();

        if let Some(token) = cached.as_ref() {
            if token.expires_at - EXPIRY_MARGIN_SECS > now {
                return Ok(token.token.clone());
            }
        }

        let assertion = self.assertion(now)?;
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;
        let issued: TokenResponse = read_json(response).await.map_err(|e| match e {
            GoogleApiError::HttpError { status, body } => {
                GoogleApiError::Auth(format!("token exchange returned {status}: {body}"))
            }
            other => other,
        })?;

        tracing::debug!(
            client_email = %self.key.client_email,
            expires_in = issued.expires_in,
            "issued google access token"
        );

        let token = issued.access_token.clone();
        *cached = Some(CachedToken {
            token: issued.access_token,
            expires_at: now + issued.expires_in,
        });
        Ok(token)
    }
}
