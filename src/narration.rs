//! Induction narration
//!
//! Optional voice guidance during the induction breathing. The orchestrator
//! emits cues at step boundaries; a host may speak them, print them, or drop
//! them. Narration availability never affects phase transitions.

use tracing::debug;

/// A narration cue fired at an induction step boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrationCue {
    SettleIn,
    BreatheIn,
    Hold,
    BreatheOut,
    CyclesComplete,
}

impl NarrationCue {
    /// The spoken line for this cue
    pub fn line(&self) -> &'static str {
        match self {
            NarrationCue::SettleIn => "Take a moment to breathe with us",
            NarrationCue::BreatheIn => "Breathe in slowly",
            NarrationCue::Hold => "Hold",
            NarrationCue::BreatheOut => "Breathe out slowly",
            NarrationCue::CyclesComplete => "You can open your eyes now. Welcome.",
        }
    }
}

/// Fire-and-forget narration notifier
pub trait Narrator: Send + Sync {
    fn announce(&self, cue: NarrationCue);
}

/// Narrator for hosts without speech output
pub struct NullNarrator;

impl Narrator for NullNarrator {
    fn announce(&self, cue: NarrationCue) {
        debug!(?cue, line = cue.line(), "narration cue");
    }
}
