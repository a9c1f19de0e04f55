//! Breathing cycle engine
//!
//! Two configurations drive the session: the induction run (a fixed number of
//! inhale/exhale cycles before anything else happens) and the extended run
//! (a long timed exercise offered after the conversation ends). Both are pure
//! tick-driven state; the session runtime owns the actual timers and feeds
//! ticks in.

use serde::Serialize;
use tracing::debug;

/// Sub-phase within a breathing cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubPhase {
    Inhale,
    Hold,
    Exhale,
}

/// Outcome of one induction breath tick (one tick = one sub-phase elapsed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InductionTick {
    /// Moved into the given sub-phase
    Advance(SubPhase),
    /// An exhale finished; the cycle count grew to the given value
    CycleComplete(u32),
    /// All cycles are done
    Finished,
}

/// Induction run: `max_cycles` breaths, one sub-phase per tick
///
/// A cycle counts as complete when its exhale finishes. Once finished,
/// further ticks report `Finished` without growing the count; a re-entered
/// induction is a fresh `InductionRun` with the count back at zero.
#[derive(Debug, Clone)]
pub struct InductionRun {
    cycles_completed: u32,
    max_cycles: u32,
    sub_phase: SubPhase,
    hold_enabled: bool,
    finished: bool,
}

impl InductionRun {
    pub fn new(max_cycles: u32, hold_enabled: bool) -> Self {
        Self {
            cycles_completed: 0,
            max_cycles,
            sub_phase: SubPhase::Inhale,
            hold_enabled,
            finished: false,
        }
    }

    /// Advance one sub-phase
    pub fn on_breath_tick(&mut self) -> InductionTick {
        if self.finished {
            return InductionTick::Finished;
        }

        match self.sub_phase {
            SubPhase::Inhale if self.hold_enabled => {
                self.sub_phase = SubPhase::Hold;
                InductionTick::Advance(SubPhase::Hold)
            }
            SubPhase::Inhale | SubPhase::Hold => {
                self.sub_phase = SubPhase::Exhale;
                InductionTick::Advance(SubPhase::Exhale)
            }
            SubPhase::Exhale => {
                self.cycles_completed += 1;
                self.sub_phase = SubPhase::Inhale;
                debug!(
                    cycles = self.cycles_completed,
                    max = self.max_cycles,
                    "induction cycle complete"
                );
                if self.cycles_completed >= self.max_cycles {
                    self.finished = true;
                    InductionTick::Finished
                } else {
                    InductionTick::CycleComplete(self.cycles_completed)
                }
            }
        }
    }

    pub fn cycles_completed(&self) -> u32 {
        self.cycles_completed
    }

    pub fn max_cycles(&self) -> u32 {
        self.max_cycles
    }

    pub fn sub_phase(&self) -> SubPhase {
        self.sub_phase
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Outcome of one overall-countdown tick in the extended run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    /// Seconds still remaining
    Continue(u32),
    /// The countdown reached zero
    Finished,
}

/// Extended run: a fixed total countdown over repeating inhale/exhale
/// sub-phases
///
/// Three independent timers feed this state: the overall countdown (1 s), the
/// sub-phase flip (one sub-phase length) and the sub-phase progress (1 s).
/// Completion is driven solely by the overall countdown reaching zero; the
/// alternation keeps going through the final second.
#[derive(Debug, Clone)]
pub struct ExtendedRun {
    remaining: u32,
    sub_phase: SubPhase,
    elapsed_in_sub_phase: u32,
    sub_phase_secs: u32,
}

impl ExtendedRun {
    pub fn new(total_secs: u32, sub_phase_secs: u32) -> Self {
        Self {
            remaining: total_secs,
            sub_phase: SubPhase::Inhale,
            elapsed_in_sub_phase: 0,
            sub_phase_secs: sub_phase_secs.max(1),
        }
    }

    /// One second off the overall countdown
    pub fn on_countdown_tick(&mut self) -> CountdownTick {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            debug!("extended breathing countdown finished");
            CountdownTick::Finished
        } else {
            CountdownTick::Continue(self.remaining)
        }
    }

    /// One second of sub-phase progress; wraps at the sub-phase length so the
    /// elapsed count never reaches the bound between ticks
    pub fn on_progress_tick(&mut self) {
        self.elapsed_in_sub_phase = (self.elapsed_in_sub_phase + 1) % self.sub_phase_secs;
    }

    /// Flip inhale/exhale and reset the sub-phase clock
    pub fn on_flip_tick(&mut self) -> SubPhase {
        self.sub_phase = match self.sub_phase {
            SubPhase::Inhale => SubPhase::Exhale,
            SubPhase::Hold | SubPhase::Exhale => SubPhase::Inhale,
        };
        self.elapsed_in_sub_phase = 0;
        self.sub_phase
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn sub_phase(&self) -> SubPhase {
        self.sub_phase
    }

    /// Per-second countdown within the sub-phase, always in `1..=sub_phase_secs`
    pub fn sub_phase_timer(&self) -> u32 {
        self.sub_phase_secs - self.elapsed_in_sub_phase
    }

    /// Sub-phase progress percentage, always in `[0, 100)`
    pub fn progress_percent(&self) -> u32 {
        self.elapsed_in_sub_phase * 100 / self.sub_phase_secs
    }
}
