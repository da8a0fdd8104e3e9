// Client-credentials token acquisition against the Sophos identity provider
use crate::error::{CentralError, Result};
use crate::models::{BearerToken, Credentials};
use crate::session::Session;
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::time::Duration as StdDuration;

const TOKEN_SCOPE: &str = "token";
const TOKEN_TIMEOUT_SECONDS: u64 = 20;
const DEFAULT_EXPIRES_IN_SECONDS: i64 = 3600;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

/// Lazily refreshes the session's bearer token.
///
/// The token is the only cached thing in the system: a time-bounded
/// credential, renewed when a call finds it inside the pre-expiry margin.
pub struct TokenManager {
    http: reqwest::Client,
    token_url: String,
}

impl TokenManager {
    pub fn new(http: reqwest::Client, token_url: String) -> Self {
        Self { http, token_url }
    }

    /// Make sure the session holds a usable token, refreshing it if needed.
    ///
    /// A fresh token makes this a no-op with no network call. On failure the
    /// session is left exactly as it was, including any previously cached
    /// token.
    pub async fn ensure_valid_token(&self, session: &mut Session) -> Result<BearerToken> {
        if let Some(token) = session.token().filter(|t| t.is_usable()) {
            return Ok(token.clone());
        }

        let credentials = session
            .credentials()
            .cloned()
            .ok_or(CentralError::MissingCredentials)?;

        let token = self.request_token(&credentials).await?;
        session.set_token(token.clone());
        Ok(token)
    }

    async fn request_token(&self, credentials: &Credentials) -> Result<BearerToken> {
        tracing::debug!("Requesting access token from {}", self.token_url);

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("scope", TOKEN_SCOPE),
        ];

        let response = self
            .http
            .post(&self.token_url)
            .timeout(StdDuration::from_secs(TOKEN_TIMEOUT_SECONDS))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(CentralError::TokenRequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TokenResponse = response.json().await?;
        let expires_in = parsed.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECONDS);
        tracing::debug!("Token received, expires in {} seconds", expires_in);

        Ok(BearerToken {
            access_token: parsed.access_token,
            expires_at: Utc::now() + Duration::seconds(expires_in),
        })
    }
}
