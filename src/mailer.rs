//! Mail delivery collaborator.
//!
//! [`HttpMailer`] posts to a Mailtrap-style HTTP send API; [`LogMailer`]
//! only logs, for demo runs and deployments without mail credentials.
//! The pipeline treats delivery as advisory or retriable depending on the
//! workflow, so implementations just report success or failure.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use thiserror::Error;
use tracing::info;

const API_URL: &str = "https://send.api.mailtrap.io";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

/// Sends a plain-text notification to one recipient.
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

pub struct HttpMailer {
    token: String,
    from: String,
    client: Client,
    base_url: String,
}

impl HttpMailer {
    pub fn new(token: String, from: String) -> Self {
        Self::with_base_url(token, from, API_URL.to_string())
    }

    /// Create a mailer pointing at a custom base URL (useful for testing).
    pub fn with_base_url(token: String, from: String, base_url: String) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(15))
            .build()
            .expect("failed to build HTTP client");
        Self {
            token,
            from,
            client,
            base_url,
        }
    }
}

#[async_trait]
impl MailSender for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let url = format!("{}/api/send", self.base_url);
        let payload = json!({
            "from": {"email": self.from},
            "to": [{"email": to}],
            "subject": subject,
            "text": body,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(MailError::ApiError {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

/// Mailer that logs instead of delivering.
pub struct LogMailer;

#[async_trait]
impl MailSender for LogMailer {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), MailError> {
        info!(to, subject, "mail transport not configured, logging instead");
        Ok(())
    }
}
