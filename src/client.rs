use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;

/// Default address of the idea service
pub const DEFAULT_BASE_URL: &str = "https://centelha-de-ideias.onrender.com";

#[derive(Deserialize)]
struct IdeaResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    message: Option<String>,
    // The reference backend puts its error text under `text`
    text: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// The service answered with a non-2xx status
    #[error("service returned {status}: {message}")]
    Rejected { status: StatusCode, message: String },

    /// The request never produced a response (offline, refused, timed out)
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A 2xx response whose body had no readable `text`
    #[error("reply could not be read: {0}")]
    MalformedReply(String),

    /// The task running the request panicked or was cancelled
    #[error("request task ended unexpectedly: {0}")]
    TaskFailed(String),
}

#[derive(Clone)]
pub struct IdeaClient {
    client: Client,
    base_url: String,
}

impl IdeaClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SendError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/centelha", self.base_url)
    }

    /// Post one message and wait for the reply text.
    ///
    /// The body is the message itself JSON-encoded as a bare string.
    pub async fn send(&self, message: &str) -> Result<String, SendError> {
        let url = self.endpoint();
        tracing::info!(%url, chars = message.chars().count(), "sending message");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(status, &body);
            tracing::warn!(%status, %message, "service rejected message");
            return Err(SendError::Rejected { status, message });
        }

        let body = response.text().await?;
        let reply: IdeaResponse = serde_json::from_str(&body)
            .map_err(|e| SendError::MalformedReply(e.to_string()))?;
        let text = reply
            .text
            .ok_or_else(|| SendError::MalformedReply("missing `text` field".to_string()))?;

        tracing::info!(%status, chars = text.chars().count(), "reply received");
        Ok(text)
    }
}

/// Pick the human readable message out of an error body
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|e| e.message.or(e.text))
        .unwrap_or_else(|| status.to_string())
}
