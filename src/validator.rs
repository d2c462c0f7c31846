use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

use crate::error::ValidatorError;

// Does the identity exist in the external user directory
#[async_trait]
pub trait IdentityValidator: Send + Sync {
    async fn exists(&self, identity: &str) -> Result<bool, ValidatorError>;
}

const MAX_USERNAME_LEN: usize = 39;

// GitHub usernames: ASCII alphanumerics and inner hyphens, at most 39 chars
pub fn is_plausible_username(identity: &str) -> bool {
    !identity.is_empty()
        && identity.len() <= MAX_USERNAME_LEN
        && !identity.starts_with('-')
        && !identity.ends_with('-')
        && identity.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

// Looks users up via GET {base}/users/{identity}
pub struct GitHubValidator {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl GitHubValidator {
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("view-counter/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }
}

#[async_trait]
impl IdentityValidator for GitHubValidator {
    async fn exists(&self, identity: &str) -> Result<bool, ValidatorError> {
        if !is_plausible_username(identity) {
            tracing::debug!(identity, "rejected identity without lookup");
            return Ok(false);
        }

        let url = format!("{}/users/{}", self.base_url, identity);
        let mut request = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let res = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ValidatorError::Timeout
            } else {
                ValidatorError::Unavailable(e.to_string())
            }
        })?;

        match res.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            other => {
                tracing::warn!(identity, status = %other, "unexpected directory response");
                Err(ValidatorError::Unavailable(format!("status {other}")))
            }
        }
    }
}
