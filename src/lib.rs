//! Shanti - guided wellbeing session orchestrator
//!
//! Shanti walks one user through a scripted wellbeing session: a guided
//! breathing induction, an ambient-audio interlude, a conversational exchange
//! driven by an external response service, a longer breathing exercise, a
//! second interlude and a feedback step. The heart of the crate is the
//! session orchestrator - a single-session state machine that sequences the
//! phases, drives the independently ticking timers, and decides every
//! transition; the service it talks to is an opaque capability that only
//! returns the next prompt and an end-of-session signal.
//!
//! # Core Concepts
//!
//! - **One explicit session**: all state lives in a `Session` value; every
//!   transition is `apply(event) -> effects`, testable without a runtime
//! - **Timers feed events**: each timer role ticks into one channel; the
//!   runtime owns the timers and executes the effect lists
//! - **Every failure degrades locally**: service, audio and feedback errors
//!   all have a defined fallback; nothing is fatal to the session
//!
//! # Modules
//!
//! - [`session`] - phase graph, session aggregate and runtime actor
//! - [`breathing`] - induction and extended breathing engines
//! - [`interlude`] - ambient-audio countdown and loop modes
//! - [`conversation`] - transcript, prompts and fallbacks
//! - [`dialogue`] - wire types and client for the response service
//! - [`timer`] - the repeating countdown primitive
//! - [`config`] - configuration types and loading

pub mod audio;
pub mod breathing;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod dialogue;
pub mod feedback;
pub mod interlude;
pub mod narration;
pub mod session;
pub mod timer;

// Re-export commonly used types
pub use audio::{AudioError, AudioSink, NullAudioSink};
pub use breathing::{ExtendedRun, InductionRun, SubPhase};
pub use config::{AudioConfig, Config, DialogueConfig, FeedbackConfig, SessionConfig};
pub use conversation::ConversationLoop;
pub use dialogue::{DialogueClient, DialogueError, DialogueReply, DialogueRequest, HttpDialogueClient, Role, SessionStage, Turn};
pub use feedback::{FeedbackReport, FeedbackSink, HttpFeedbackSink, NullFeedbackSink};
pub use interlude::{InterludeRun, InterludeView};
pub use narration::{NarrationCue, Narrator, NullNarrator};
pub use session::{
    BreathingView, Effect, Phase, Session, SessionEvent, SessionHandle, SessionNotice, SessionRuntime, SessionView,
    TimerRole, UserAction,
};
pub use timer::{PhaseTimer, TickOutcome};
