// cloudsql-restore-resource/src/sqladmin/auth.rs
//! Google service-account credentials held in memory.
//!
//! The key is parsed and validated when the authenticator is built, so bad
//! credentials fail the step before any API call. Tokens are minted with
//! the JWT-bearer grant and cached until shortly before they expire, since
//! a single `in` step can poll for longer than one token lives.
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use chrono::Utc;
use ring::rand::SystemRandom;
use ring::signature::{RSA_PKCS1_SHA256, RsaKeyPair};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use super::Authenticator;
use crate::errors::{ResourceError, Result};

pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default)]
    private_key_id: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: i64,
}

impl CachedToken {
    fn is_fresh(&self, now: i64) -> bool {
        now + REFRESH_MARGIN_SECS < self.expires_at
    }
}

pub struct ServiceAccountAuthenticator {
    client_email: String,
    private_key_id: Option<String>,
    token_uri: String,
    key_pair: RsaKeyPair,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuthenticator {
    /// Parses the JSON key file contents passed as `source.private_key`.
    ///
    /// `request_timeout` bounds each token exchange the same way it bounds API calls.
    pub fn from_json(raw_key: &str, request_timeout: Duration) -> Result<Self> {
        let key: ServiceAccountKey = serde_json::from_str(raw_key)
            .map_err(|e| ResourceError::Credential(format!("private_key is not a service account key: {e}")))?;
        let der = pem_to_der(&key.private_key)?;
        let key_pair = RsaKeyPair::from_pkcs8(&der)
            .map_err(|e| ResourceError::Credential(format!("private key rejected: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ResourceError::Credential(format!("failed to build token client: {e}")))?;

        Ok(ServiceAccountAuthenticator {
            client_email: key.client_email,
            private_key_id: key.private_key_id,
            token_uri: key
                .token_uri
                .filter(|uri| !uri.is_empty())
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
            key_pair,
            http,
            cached: Mutex::new(None),
        })
    }

    fn assertion(&self, now: i64) -> Result<String> {
        let mut header = serde_json::json!({ "alg": "RS256", "typ": "JWT" });
        if let Some(kid) = &self.private_key_id {
            header["kid"] = serde_json::Value::String(kid.clone());
        }
        let claims = claims_for(&self.client_email, &self.token_uri, now);
        let claims_json =
            serde_json::to_vec(&claims).map_err(|e| ResourceError::Credential(format!("failed to encode claims: {e}")))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header.to_string()),
            URL_SAFE_NO_PAD.encode(claims_json)
        );
        let mut signature = vec![0u8; self.key_pair.public().modulus_len()];
        self.key_pair
            .sign(&RSA_PKCS1_SHA256, &SystemRandom::new(), signing_input.as_bytes(), &mut signature)
            .map_err(|_| ResourceError::Credential("failed to sign token assertion".to_string()))?;

        Ok(format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature)))
    }

    async fn fetch_token(&self, now: i64) -> Result<CachedToken> {
        let assertion = self.assertion(now)?;
        let response = self
            .http
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| ResourceError::Credential(format!("token request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ResourceError::Credential(format!("token response unreadable: {e}")))?;
        if !status.is_success() {
            return Err(ResourceError::Credential(format!("token endpoint returned {status}: {body}")));
        }
        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| ResourceError::decode("token response", e))?;
        debug!(account = %self.client_email, "obtained access token");

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: now + token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS),
        })
    }
}

#[async_trait]
impl Authenticator for ServiceAccountAuthenticator {
    async fn bearer_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now().timestamp();
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.access_token.clone());
        }
        let token = self.fetch_token(now).await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }
}

fn claims_for<'a>(client_email: &'a str, token_uri: &'a str, now: i64) -> JwtClaims<'a> {
    JwtClaims {
        iss: client_email,
        scope: CLOUD_PLATFORM_SCOPE,
        aud: token_uri,
        iat: now,
        exp: now + ASSERTION_LIFETIME_SECS,
    }
}

fn pem_to_der(pem: &str) -> Result<Vec<u8>> {
    let label = pem
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("-----BEGIN "))
        .and_then(|rest| rest.strip_suffix("-----"));
    match label {
        Some("PRIVATE KEY") => {}
        Some(other) => {
            return Err(ResourceError::Credential(format!(
                "private key must be a PKCS#8 \"PRIVATE KEY\" PEM block, found \"{other}\""
            )));
        }
        None => return Err(ResourceError::Credential("private key has no PEM header".to_string())),
    }
    let body: String = pem
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("-----"))
        .collect();
    if body.is_empty() {
        return Err(ResourceError::Credential("private key PEM is empty".to_string()));
    }
    STANDARD
        .decode(body)
        .map_err(|e| ResourceError::Credential(format!("private key PEM is not valid base64: {e}")))
}
