//! Wire types for the conversational-response service
//!
//! The service is stateless per call: the full transcript is resent every
//! time, together with a coarse stage hint, and the reply carries the next
//! prompt plus the end-of-session signal. Field names follow the service's
//! camelCase wire format.

use serde::{Deserialize, Serialize};

/// One message in the session transcript, tagged by speaker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    /// Create a user turn
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    /// Create an assistant turn
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }
}

/// Speaker role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Coarse progress hint sent with every request; advisory, never
/// authoritative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStage {
    Beginning,
    Progressing,
}

/// Request body for one service call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueRequest {
    pub messages: Vec<Turn>,
    #[serde(rename = "sessionState")]
    pub session_state: SessionStage,
}

/// Reply from the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueReply {
    /// The next prompt to put to the user
    pub question: String,

    /// The service alone decides natural termination
    #[serde(rename = "shouldEnd")]
    pub should_end: bool,

    /// Diagnostic rationale; logged, never used for control flow
    #[serde(default)]
    pub reasoning: String,
}
