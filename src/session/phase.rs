//! Top-level session phases

use serde::Serialize;

/// Mutually-exclusive top-level mode of the session
///
/// Left-to-right on the default path; the conversation is a sub-loop that
/// persists until the service or the user ends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Guided breathing before anything else happens
    InitialBreathing,
    /// Ambient audio countdown before the conversation
    PreludeInterlude,
    /// The prompt/reply exchange with the service
    Conversation,
    /// The exchange has ended; breathing or feedback next
    SessionEnded,
    /// The long timed breathing exercise
    ExtendedBreathing,
    /// Looping ambient audio after the exercise
    PostludeInterlude,
    /// Feedback capture
    Feedback,
    /// Feedback accepted; only a new session remains
    FeedbackSubmitted,
}

impl Phase {
    /// Display name for host headers
    pub fn display_name(&self) -> &'static str {
        match self {
            Phase::InitialBreathing => "Breathing",
            Phase::PreludeInterlude => "Peaceful Music",
            Phase::Conversation => "Conversation",
            Phase::SessionEnded => "Session Ended",
            Phase::ExtendedBreathing => "Breathing Exercise",
            Phase::PostludeInterlude => "Peaceful Music",
            Phase::Feedback => "Feedback",
            Phase::FeedbackSubmitted => "Thank You",
        }
    }
}
