//! Checks HTTP Basic credentials against the school's credential endpoint.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential endpoint unreachable: {0}")]
    Request(#[from] reqwest::Error),

    #[error("credential endpoint responded with status {0}")]
    Status(u16),
}

/// Verifies a username/password pair.
#[async_trait::async_trait]
pub trait CredentialChecker: Send + Sync {
    /// `Ok(false)` means the credentials were rejected.
    async fn check(&self, username: &str, password: &str) -> Result<bool, CredentialError>;
}

#[derive(Debug, Deserialize)]
struct CheckResponse {
    #[serde(default)]
    status: bool,
}

/// Forwards the caller's credentials as Basic auth in a GET to `url`.
pub struct HttpCredentialChecker {
    client: Client,
    url: String,
}

impl HttpCredentialChecker {
    pub fn new(url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait::async_trait]
impl CredentialChecker for HttpCredentialChecker {
    async fn check(&self, username: &str, password: &str) -> Result<bool, CredentialError> {
        let response = self
            .client
            .get(&self.url)
            .basic_auth(username, Some(password))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let body: CheckResponse = response.json().await?;
                Ok(body.status)
            }
            StatusCode::UNAUTHORIZED => Ok(false),
            other => Err(CredentialError::Status(other.as_u16())),
        }
    }
}

/// Accepts any credentials. Used when authentication is disabled.
pub struct AcceptAllCredentials;

#[async_trait::async_trait]
impl CredentialChecker for AcceptAllCredentials {
    async fn check(&self, _username: &str, _password: &str) -> Result<bool, CredentialError> {
        Ok(true)
    }
}
