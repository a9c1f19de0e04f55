//! Conversation loop
//!
//! Owns the transcript and the current prompt, builds service requests,
//! applies replies or local fallbacks, and tracks the reveal threshold for
//! the early-exit controls. All state changes are synchronous; the session
//! runtime performs the actual service calls.

use rand::seq::IndexedRandom;
use tracing::{debug, warn};

use crate::dialogue::{DialogueReply, DialogueRequest, SessionStage, Turn};

/// Opening prompt used when the very first service call fails
pub const OPENING_FALLBACK: &str = "How are you feeling today?";

/// Prompt substituted when a mid-conversation service call fails
pub const TURN_FALLBACK: &str = "Tell me more about that.";

/// Prompt substituted when the user closes the session manually
pub const CLOSE_OFFER: &str = "Would you like a three-minute breathing session to unwind?";

/// Transcript length beyond which the stage hint flips to "progressing"
const PROGRESSING_AFTER_ENTRIES: usize = 8;

/// Which service call is currently in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingCall {
    None,
    Opening,
    Turn,
}

/// Conversation state for one session
#[derive(Debug, Clone)]
pub struct ConversationLoop {
    transcript: Vec<Turn>,
    current_question: String,
    last_user_response: String,
    pending: PendingCall,
    session_ended: bool,
    exit_threshold: u32,
    exit_revealed: bool,
}

impl ConversationLoop {
    pub fn new(exit_threshold: u32) -> Self {
        Self {
            transcript: Vec::new(),
            current_question: String::new(),
            last_user_response: String::new(),
            pending: PendingCall::None,
            session_ended: false,
            exit_threshold,
            exit_revealed: false,
        }
    }

    /// Draw the exit threshold for a new session; drawn once, never re-rolled
    pub fn draw_exit_threshold(candidates: &[u32]) -> u32 {
        candidates.choose(&mut rand::rng()).copied().unwrap_or(7)
    }

    /// Build the opening request; `None` if a call is already pending
    pub fn begin(&mut self) -> Option<DialogueRequest> {
        if self.pending != PendingCall::None {
            return None;
        }
        self.pending = PendingCall::Opening;
        Some(DialogueRequest {
            messages: Vec::new(),
            session_state: SessionStage::Beginning,
        })
    }

    /// Record a user turn and build the follow-up request
    ///
    /// No-op (returns `None`) when the text trims empty, a reply is already
    /// in flight, or the session has ended. Otherwise appends the prompt the
    /// user was answering followed by the user's reply, and reveals the exit
    /// controls once enough round-trips have accumulated.
    pub fn submit(&mut self, text: &str) -> Option<DialogueRequest> {
        let text = text.trim();
        if text.is_empty() || self.pending != PendingCall::None || self.session_ended {
            return None;
        }

        self.transcript.push(Turn::assistant(self.current_question.clone()));
        self.transcript.push(Turn::user(text));
        self.last_user_response = text.to_string();
        self.pending = PendingCall::Turn;

        if self.round_trips() >= self.exit_threshold && !self.exit_revealed {
            debug!(round_trips = self.round_trips(), threshold = self.exit_threshold, "exit controls revealed");
            self.exit_revealed = true;
        }

        Some(DialogueRequest {
            messages: self.transcript.clone(),
            session_state: self.stage(),
        })
    }

    /// Apply a service reply; returns whether the session just ended
    pub fn apply_reply(&mut self, reply: &DialogueReply) -> bool {
        let was_opening = self.pending == PendingCall::Opening;
        self.pending = PendingCall::None;

        if !reply.reasoning.is_empty() {
            debug!(reasoning = %reply.reasoning, "service reasoning");
        }

        // An opening reply cannot end a session that has not begun
        if reply.should_end && !was_opening {
            self.session_ended = true;
            self.current_question.clear();
            return true;
        }

        self.current_question = reply.question.clone();
        self.last_user_response.clear();
        false
    }

    /// Apply a service failure: substitute the local fallback prompt
    ///
    /// The session is never ended by a failure and no retry is attempted.
    pub fn apply_failure(&mut self) {
        match self.pending {
            PendingCall::Opening => {
                warn!("opening service call failed, using local fallback prompt");
                self.current_question = OPENING_FALLBACK.to_string();
            }
            PendingCall::Turn => {
                warn!("turn service call failed, using local fallback prompt");
                self.current_question = TURN_FALLBACK.to_string();
            }
            PendingCall::None => {}
        }
        self.pending = PendingCall::None;
    }

    /// Close the session manually, offering the breathing exercise
    pub fn close(&mut self) {
        self.session_ended = true;
        self.current_question = CLOSE_OFFER.to_string();
        self.pending = PendingCall::None;
    }

    /// Stage hint derived from transcript length
    pub fn stage(&self) -> SessionStage {
        if self.transcript.len() > PROGRESSING_AFTER_ENTRIES {
            SessionStage::Progressing
        } else {
            SessionStage::Beginning
        }
    }

    /// Completed prompt/reply pairs
    pub fn round_trips(&self) -> u32 {
        (self.transcript.len() / 2) as u32
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn current_question(&self) -> &str {
        &self.current_question
    }

    pub fn last_user_response(&self) -> &str {
        &self.last_user_response
    }

    pub fn awaiting_reply(&self) -> bool {
        self.pending != PendingCall::None
    }

    pub fn is_ended(&self) -> bool {
        self.session_ended
    }

    pub fn exit_revealed(&self) -> bool {
        self.exit_revealed
    }

    pub fn exit_threshold(&self) -> u32 {
        self.exit_threshold
    }
}
