use chrono::{DateTime, Duration, Utc};
use reqwest::{header, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::Client;

/// Tokens older than this are renewed before use.
///
/// The identity endpoint reports a lifetime with every token. The portal
/// frontend ignores it and works off a fixed clock instead, and the gateway
/// accepts that, so the same clock is used here.
const MAX_AGE_HOURS: i64 = 5;

/// A bearer token for the assignment API.
#[derive(Debug, Clone)]
pub struct Token {
    access_token: String,
    acquired_at: DateTime<Utc>,
}

impl Token {
    fn new(access_token: String) -> Self {
        Self {
            access_token,
            acquired_at: Utc::now(),
        }
    }

    /// When this token was obtained.
    #[must_use]
    pub fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }

    /// Whether the token is still young enough to use. Exactly at the
    /// threshold counts as stale.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now - self.acquired_at < Duration::hours(MAX_AGE_HOURS)
    }

    /// `Authorization` header value.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// An authentication failure.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The identity endpoint turned the credentials down.
    #[error("bad credentials")]
    BadCredentials,

    /// The identity endpoint answered with an unexpected status.
    #[error("identity endpoint returned {0}")]
    Rejected(StatusCode),

    /// Some HTTP request failed.
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    // expires_in: u64,
    // token_type: String,
}

impl Client {
    /// Return a token no older than the freshness threshold, hitting the
    /// identity endpoint when the cached one is missing or aged out, or
    /// when `force` is set.
    ///
    /// A failed renewal drops the cached token entirely, so the next call
    /// starts from scratch. There are no retries, and concurrent renewals
    /// are not deduplicated; the portal tolerates redundant logins.
    ///
    /// # Errors
    ///
    /// Fails if the identity endpoint rejects the credentials or cannot be
    /// reached.
    #[instrument(skip(self))]
    pub async fn ensure_token(&self, force: bool) -> Result<Token, AuthError> {
        if !force {
            if let Some(token) = self.token.read().await.as_ref() {
                if token.is_fresh(Utc::now()) {
                    return Ok(token.clone());
                }
                debug!("cached token aged out");
            }
        }

        match self.authenticate().await {
            Ok(token) => {
                *self.token.write().await = Some(token.clone());
                Ok(token)
            }
            Err(e) => {
                *self.token.write().await = None;
                Err(e)
            }
        }
    }

    #[instrument(skip(self))]
    async fn authenticate(&self) -> Result<Token, AuthError> {
        let form = [
            ("username", self.credentials.username.as_str()),
            (
                "password",
                self.credentials.password.expose_secret().as_str(),
            ),
            ("grant_type", "password"),
            ("client_id", self.portal.client_id.as_str()),
            ("client_secret", self.portal.client_secret.as_str()),
            ("scope", self.portal.scope.as_str()),
        ];

        let res = self
            .http
            .post(&self.portal.auth_url)
            .header(
                "Ocp-Apim-Subscription-Key",
                self.portal.subscription_key.as_str(),
            )
            .header(header::ORIGIN, self.portal.origin.as_str())
            .header(header::REFERER, self.portal.referer())
            .form(&form)
            .send()
            .await?;

        match res.status() {
            status if status.is_success() => {
                let TokenResponse { access_token } = res.json().await?;
                debug!("authenticated");
                Ok(Token::new(access_token))
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                debug!("bad credentials");
                Err(AuthError::BadCredentials)
            }
            status => Err(AuthError::Rejected(status)),
        }
    }
}
