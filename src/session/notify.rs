//! Password-reset mail delivery.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("mail service unreachable: {0}")]
    Unreachable(String),
    #[error("mail service answered with status {0}")]
    Rejected(u16),
}

/// Delivers a reset link to the owner of a login.
#[async_trait]
pub trait ResetMailer: Send + Sync {
    async fn send_reset_link(&self, login: &str, link: &str) -> Result<(), NotifyError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetMail<'a> {
    to: &'a str,
    reset_link: &'a str,
    login: &'a str,
}

/// Posts `{to, resetLink, login}` to `<base>/send-reset-email`.
#[derive(Clone)]
pub struct HttpResetMailer {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpResetMailer {
    pub fn new(base: &str) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NotifyError::Unreachable(e.to_string()))?;

        Ok(Self {
            endpoint: format!("{}/send-reset-email", base.trim_end_matches('/')),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ResetMailer for HttpResetMailer {
    async fn send_reset_link(&self, login: &str, link: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ResetMail {
                to: login,
                reset_link: link,
                login,
            })
            .send()
            .await
            .map_err(|e| NotifyError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}
