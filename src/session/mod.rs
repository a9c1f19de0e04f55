//! Session orchestration
//!
//! The composition root: the phase state machine, the session aggregate with
//! its pure transition function, and the runtime actor that executes effects
//! against real timers, audio and the dialogue service.

mod phase;
mod runtime;
mod state;

pub use phase::Phase;
pub use runtime::{SessionHandle, SessionNotice, SessionRuntime};
pub use state::{BreathingView, Effect, Session, SessionEvent, SessionView, TimerRole, UserAction};
