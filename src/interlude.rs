//! Ambient interlude controller
//!
//! An interlude plays the background track in one of two modes: a countdown
//! that advances the session when it expires, or an indefinite loop that only
//! advances on an explicit user action. Audio readiness and audio failure are
//! tracked independently; neither ever blocks a manual advance.

use serde::Serialize;
use tracing::debug;

/// Playback mode; exactly one is active per run by construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterludeMode {
    /// Count down the given remaining seconds, then advance
    Countdown { remaining: u32 },
    /// Loop the track until the user advances
    Loop,
}

/// Outcome of one countdown tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterludeTick {
    /// Seconds still remaining
    Continue(u32),
    /// The countdown expired
    Finished,
    /// Tick received in loop mode; nothing to count
    Ignored,
}

/// State of an active interlude
#[derive(Debug, Clone)]
pub struct InterludeRun {
    mode: InterludeMode,
    audio_ready: bool,
    audio_errored: bool,
}

impl InterludeRun {
    pub fn countdown(secs: u32) -> Self {
        Self {
            mode: InterludeMode::Countdown { remaining: secs },
            audio_ready: false,
            audio_errored: false,
        }
    }

    pub fn looping() -> Self {
        Self {
            mode: InterludeMode::Loop,
            audio_ready: false,
            audio_errored: false,
        }
    }

    /// One second elapsed
    pub fn on_tick(&mut self) -> InterludeTick {
        match &mut self.mode {
            InterludeMode::Countdown { remaining } => {
                *remaining = remaining.saturating_sub(1);
                if *remaining == 0 {
                    debug!("interlude countdown expired");
                    InterludeTick::Finished
                } else {
                    InterludeTick::Continue(*remaining)
                }
            }
            InterludeMode::Loop => InterludeTick::Ignored,
        }
    }

    pub fn note_audio_ready(&mut self) {
        self.audio_ready = true;
    }

    pub fn note_audio_error(&mut self) {
        debug!("interlude audio errored");
        self.audio_errored = true;
    }

    /// The manual "start music" control is offered only while the track is
    /// neither ready nor failed
    pub fn offers_manual_start(&self) -> bool {
        !self.audio_ready && !self.audio_errored
    }

    pub fn is_looping(&self) -> bool {
        matches!(self.mode, InterludeMode::Loop)
    }

    /// Remaining seconds; meaningful only in countdown mode
    pub fn remaining(&self) -> Option<u32> {
        match self.mode {
            InterludeMode::Countdown { remaining } => Some(remaining),
            InterludeMode::Loop => None,
        }
    }

    pub fn audio_errored(&self) -> bool {
        self.audio_errored
    }

    pub fn view(&self) -> InterludeView {
        InterludeView {
            remaining: self.remaining(),
            looping: self.is_looping(),
            offers_manual_start: self.offers_manual_start(),
            audio_errored: self.audio_errored,
        }
    }
}

/// Render snapshot of an interlude
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterludeView {
    pub remaining: Option<u32>,
    pub looping: bool,
    pub offers_manual_start: bool,
    pub audio_errored: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_expires_after_its_full_duration() {
        let mut run = InterludeRun::countdown(55);

        for expected in (1..55).rev() {
            assert_eq!(run.on_tick(), InterludeTick::Continue(expected));
        }
        assert_eq!(run.on_tick(), InterludeTick::Finished);
    }

    #[test]
    fn loop_mode_ignores_ticks() {
        let mut run = InterludeRun::looping();
        assert_eq!(run.on_tick(), InterludeTick::Ignored);
        assert_eq!(run.on_tick(), InterludeTick::Ignored);
        assert_eq!(run.remaining(), None);
        assert!(run.is_looping());
    }

    #[test]
    fn manual_start_hides_once_audio_is_ready_or_errored() {
        let mut run = InterludeRun::countdown(55);
        assert!(run.offers_manual_start());

        run.note_audio_ready();
        assert!(!run.offers_manual_start());

        let mut run = InterludeRun::looping();
        run.note_audio_error();
        assert!(!run.offers_manual_start());
        assert!(run.audio_errored());
    }

    #[test]
    fn audio_error_does_not_stop_the_countdown() {
        let mut run = InterludeRun::countdown(2);
        run.note_audio_error();
        assert_eq!(run.on_tick(), InterludeTick::Continue(1));
        assert_eq!(run.on_tick(), InterludeTick::Finished);
    }
}
