// src/auth.rs
//! Client-credentials token lifecycle against the Keycloak token endpoint.
//!
//! Each poll loop owns its own `TokenManager`; the internal mutex only
//! matters if an instance is ever shared across tasks.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::config::NotifierConfig;

/// Used when the token endpoint omits `expires_in`.
const DEFAULT_EXPIRY_SECS: u64 = 300;
/// A cached token is refreshed this long before it actually expires, so the
/// caller always holds one valid across the following request.
const EXPIRY_SKEW: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("token endpoint returned {status}: {body}")]
    Endpoint { status: u16, body: String },
    #[error("invalid token response: {0}")]
    InvalidResponse(String),
}

#[derive(Clone, Debug)]
pub struct Credential {
    pub access_token: String,
    pub expires_at: Instant,
    pub refresh_token: Option<String>,
}

impl Credential {
    fn is_valid(&self, now: Instant) -> bool {
        self.expires_at > now + EXPIRY_SKEW
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

pub struct TokenManager {
    http: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    cached: Mutex<Option<Credential>>,
}

impl TokenManager {
    pub fn new(token_url: String, client_id: String, client_secret: String) -> Self {
        Self {
            http: Client::new(),
            token_url,
            client_id,
            client_secret,
            cached: Mutex::new(None),
        }
    }

    pub fn from_config(config: &NotifierConfig) -> Self {
        Self::new(
            config.token_url(),
            config.keycloak_client_id.clone(),
            config.keycloak_client_secret.clone(),
        )
    }

    /// Returns a bearer token valid at the moment of return, reacquiring via
    /// the client-credentials grant when the cache is empty or near expiry.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        if let Some(cred) = self.cached.lock().unwrap().as_ref() {
            if cred.is_valid(Instant::now()) {
                return Ok(cred.access_token.clone());
            }
        }

        let cred = self.acquire().await?;
        let token = cred.access_token.clone();
        *self.cached.lock().unwrap() = Some(cred);
        Ok(token)
    }

    /// Drops the cached credential. Called on a 401-class admin response so
    /// the next cycle performs a fresh acquisition.
    pub fn invalidate(&self) {
        self.cached.lock().unwrap().take();
    }

    async fn acquire(&self) -> Result<Credential, AuthError> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        let response = self.http.post(&self.token_url).form(&form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Endpoint {
                status: status.as_u16(),
                body,
            });
        }

        let payload: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;
        if payload.access_token.is_empty() {
            return Err(AuthError::InvalidResponse(
                "missing access_token in token response".into(),
            ));
        }

        let expires_in = payload.expires_in.unwrap_or(DEFAULT_EXPIRY_SECS).max(1);
        tracing::debug!(expires_in, "acquired access token");

        Ok(Credential {
            access_token: payload.access_token,
            expires_at: Instant::now() + Duration::from_secs(expires_in),
            refresh_token: payload.refresh_token,
        })
    }
}
