//! Discord REST client: message create/edit plus webhook execution.
//!
//! Thin wrapper around reqwest with a bounded timeout. The base URL is
//! overridable so tests can point it at a mock server.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://discord.com/api/v10";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum DiscordError {
    /// Transport-level failure, including the bounded timeout.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-success response from the API.
    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },
}

/// Interactive button on a message. Wire representation of one component.
#[derive(Debug, Clone, Serialize)]
pub struct Button {
    #[serde(rename = "type")]
    pub kind: u8,
    pub style: u8,
    pub label: String,
    pub custom_id: String,
}

impl Button {
    pub const STYLE_SUCCESS: u8 = 3;
    pub const STYLE_DANGER: u8 = 4;

    pub fn new(style: u8, label: &str, custom_id: String) -> Self {
        Self {
            kind: 2,
            style,
            label: label.to_string(),
            custom_id,
        }
    }
}

/// Row of buttons. Discord wraps components in rows of type 1.
#[derive(Debug, Clone, Serialize)]
pub struct ActionRow {
    #[serde(rename = "type")]
    pub kind: u8,
    pub components: Vec<Button>,
}

impl ActionRow {
    pub fn new(components: Vec<Button>) -> Self {
        Self {
            kind: 1,
            components,
        }
    }
}

/// Body for message create/edit. `components` is always serialized so an edit
/// with an empty vec strips the buttons from the original message.
#[derive(Debug, Clone, Serialize)]
pub struct MessagePayload {
    pub content: String,
    pub components: Vec<ActionRow>,
}

/// Identifiers of a posted message.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageRef {
    pub id: String,
    pub channel_id: String,
}

#[derive(Clone)]
pub struct DiscordClient {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

impl DiscordClient {
    /// Creates a client for the public API using the given bot token.
    pub fn new(token: String) -> Self {
        Self::with_base_url(token, DEFAULT_API_URL.to_string())
    }

    /// Creates a client against a custom base URL (tests point this at a mock
    /// server).
    pub fn with_base_url(token: String, base_url: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");
        Self {
            http,
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Posts a message to a channel, returning its identifiers.
    pub async fn create_message(
        &self,
        channel_id: &str,
        payload: &MessagePayload,
    ) -> Result<MessageRef, DiscordError> {
        let url = format!("{}/channels/{}/messages", self.base_url, channel_id);
        debug!(channel_id = %channel_id, "Posting message");

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bot {}", self.token))
            .json(payload)
            .send()
            .await
            .map_err(|e| DiscordError::Http(e.to_string()))?;

        let response = Self::check(response).await?;
        response
            .json::<MessageRef>()
            .await
            .map_err(|e| DiscordError::Http(e.to_string()))
    }

    /// Edits an already-posted message (content and components replaced).
    pub async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        payload: &MessagePayload,
    ) -> Result<(), DiscordError> {
        let url = format!(
            "{}/channels/{}/messages/{}",
            self.base_url, channel_id, message_id
        );
        debug!(channel_id = %channel_id, message_id = %message_id, "Editing message");

        let response = self
            .http
            .patch(&url)
            .header("Authorization", format!("Bot {}", self.token))
            .json(payload)
            .send()
            .await
            .map_err(|e| DiscordError::Http(e.to_string()))?;

        Self::check(response).await?;
        Ok(())
    }

    /// Posts plain content through a webhook URL (the non-interactive
    /// fallback delivery).
    pub async fn execute_webhook(
        &self,
        webhook_url: &str,
        content: &str,
    ) -> Result<(), DiscordError> {
        let response = self
            .http
            .post(webhook_url)
            .json(&serde_json::json!({ "content": content }))
            .send()
            .await
            .map_err(|e| DiscordError::Http(e.to_string()))?;

        Self::check(response).await?;
        Ok(())
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, DiscordError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(DiscordError::Api {
            status: status.as_u16(),
            body,
        })
    }
}
