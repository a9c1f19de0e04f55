//! PhaseTimer - generic repeating countdown
//!
//! The building block for every timed phase: ticks at a fixed real-time
//! interval until the tick callback signals stop or the timer is cancelled.
//! Backed by a spawned tokio task; the handle owns the task and aborts it on
//! cancel or drop, so no callback can outlive its phase.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::debug;

/// What the tick callback wants the timer to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Keep ticking
    Continue,
    /// Stop ticking and run the completion callback
    Stop,
}

/// Repeating countdown timer
///
/// At most one run is active per `PhaseTimer` value: `start` cancels any
/// previous run before installing the new one, so re-entering a phase never
/// produces duplicate ticking.
#[derive(Debug, Default)]
pub struct PhaseTimer {
    task: Option<JoinHandle<()>>,
}

impl PhaseTimer {
    pub fn new() -> Self {
        Self { task: None }
    }

    /// Start ticking every `interval`
    ///
    /// `on_tick` receives the number of elapsed ticks (starting at 1) and
    /// decides whether to continue. `on_complete` runs only after a
    /// stop-signalled tick, never after a cancel.
    pub fn start<T, D>(&mut self, interval: Duration, mut on_tick: T, on_complete: D)
    where
        T: FnMut(u64) -> TickOutcome + Send + 'static,
        D: FnOnce() + Send + 'static,
    {
        self.cancel();
        debug!(?interval, "PhaseTimer::start");

        self.task = Some(tokio::spawn(async move {
            // interval_at so the first tick lands one full interval from now
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            let mut elapsed: u64 = 0;
            loop {
                ticker.tick().await;
                elapsed += 1;
                if on_tick(elapsed) == TickOutcome::Stop {
                    break;
                }
            }
            on_complete();
        }));
    }

    /// Cancel the timer
    ///
    /// Idempotent and safe to call when not running.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("PhaseTimer::cancel: run aborted");
        }
    }

    /// Whether a run is currently active
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for PhaseTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[derive(Debug, PartialEq)]
    enum Msg {
        Tick(u64),
        Done,
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_arrive_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = PhaseTimer::new();
        timer.start(
            Duration::from_secs(1),
            move |elapsed| {
                let _ = tx.send(Msg::Tick(elapsed));
                TickOutcome::Continue
            },
            || {},
        );

        for expected in 1..=3 {
            assert_eq!(rx.recv().await, Some(Msg::Tick(expected)));
        }
        timer.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_outcome_runs_completion_and_halts() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let done_tx = tx.clone();
        let mut timer = PhaseTimer::new();
        timer.start(
            Duration::from_secs(1),
            move |elapsed| {
                let _ = tx.send(Msg::Tick(elapsed));
                if elapsed == 3 { TickOutcome::Stop } else { TickOutcome::Continue }
            },
            move || {
                let _ = done_tx.send(Msg::Done);
            },
        );

        assert_eq!(rx.recv().await, Some(Msg::Tick(1)));
        assert_eq!(rx.recv().await, Some(Msg::Tick(2)));
        assert_eq!(rx.recv().await, Some(Msg::Tick(3)));
        assert_eq!(rx.recv().await, Some(Msg::Done));
        // Both senders dropped with the finished task: no further ticks possible
        assert_eq!(rx.recv().await, None);
        assert!(!timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent() {
        let mut timer = PhaseTimer::new();
        // Never started
        timer.cancel();
        timer.cancel();

        let (tx, mut rx) = mpsc::unbounded_channel();
        timer.start(
            Duration::from_secs(1),
            move |elapsed| {
                let _ = tx.send(Msg::Tick(elapsed));
                TickOutcome::Continue
            },
            || {},
        );
        timer.cancel();
        timer.cancel();

        // The aborted task dropped its sender without ever ticking
        assert_eq!(rx.recv().await, None);
        assert!(!timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_cancels_previous_run() {
        let mut timer = PhaseTimer::new();

        let (tx_old, mut rx_old) = mpsc::unbounded_channel();
        timer.start(
            Duration::from_secs(1),
            move |elapsed| {
                let _ = tx_old.send(Msg::Tick(elapsed));
                TickOutcome::Continue
            },
            || {},
        );

        let (tx_new, mut rx_new) = mpsc::unbounded_channel();
        timer.start(
            Duration::from_secs(1),
            move |elapsed| {
                let _ = tx_new.send(Msg::Tick(elapsed));
                TickOutcome::Continue
            },
            || {},
        );

        // Only the replacement run ever ticks
        assert_eq!(rx_new.recv().await, Some(Msg::Tick(1)));
        assert_eq!(rx_old.recv().await, None);
        timer.cancel();
    }
}
