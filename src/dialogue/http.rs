//! HTTP dialogue client
//!
//! Posts the transcript to the configured endpoint as JSON and parses the
//! reply. One attempt per call, no retry; callers substitute a local
//! fallback prompt on failure.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::DialogueConfig;

use super::{DialogueClient, DialogueError, DialogueReply, DialogueRequest};

/// Client for the conversational-response service
pub struct HttpDialogueClient {
    endpoint: String,
    http: Client,
}

impl HttpDialogueClient {
    /// Create a new client from configuration
    pub fn from_config(config: &DialogueConfig) -> Result<Self, DialogueError> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build().map_err(DialogueError::Network)?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            http,
        })
    }
}

#[async_trait]
impl DialogueClient for HttpDialogueClient {
    async fn next_prompt(&self, request: DialogueRequest) -> Result<DialogueReply, DialogueError> {
        debug!(
            endpoint = %self.endpoint,
            message_count = request.messages.len(),
            stage = ?request.session_state,
            "next_prompt: calling service"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(DialogueError::Network)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DialogueError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let reply: DialogueReply = response.json().await.map_err(DialogueError::Network)?;

        if reply.question.trim().is_empty() && !reply.should_end {
            return Err(DialogueError::InvalidReply("empty question without end signal".to_string()));
        }

        debug!(should_end = reply.should_end, "next_prompt: reply received");
        Ok(reply)
    }
}
