//! Dialogue service error types

use thiserror::Error;

/// Errors that can occur talking to the conversational-response service
///
/// Every variant is recovered locally with a fallback prompt; nothing here
/// ever reaches the user as a hard failure.
#[derive(Debug, Error)]
pub enum DialogueError {
    #[error("service error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid reply: {0}")]
    InvalidReply(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DialogueError {
    /// Whether the failure happened before the service produced any reply
    pub fn is_transport(&self) -> bool {
        matches!(self, DialogueError::Network(_) | DialogueError::Api { .. })
    }
}
