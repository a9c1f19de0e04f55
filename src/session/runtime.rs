//! Session runtime
//!
//! The actor that puts the pure transition logic in motion: it owns one
//! `PhaseTimer` per timer role, the audio sink, the dialogue client and the
//! feedback sink, and drains a single event channel. Timer ticks, service
//! replies and user actions all arrive as `SessionEvent`s; the runtime applies
//! them to the `Session` and executes the returned effects. Hosts observe the
//! session through a `watch` snapshot channel and a `broadcast` notice
//! channel.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};

use crate::audio::AudioSink;
use crate::config::SessionConfig;
use crate::dialogue::DialogueClient;
use crate::feedback::{FeedbackReport, FeedbackSink};
use crate::narration::{Narrator, NullNarrator};
use crate::timer::{PhaseTimer, TickOutcome};

use super::state::{Effect, Session, SessionEvent, SessionView, UserAction};
use super::{Phase, TimerRole};

/// Event channel capacity; ticks are one per second per role, so this is
/// weeks of headroom
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Notice channel capacity
const NOTICE_CHANNEL_CAPACITY: usize = 64;

/// One-shot notices for the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    /// The induction finished; the host may reveal its main surface
    InductionComplete,
    /// The session moved to a new top-level phase
    PhaseChanged(Phase),
    /// The session was discarded and rebuilt
    SessionReset,
}

/// Handle for hosts to drive and observe a running session
#[derive(Clone)]
pub struct SessionHandle {
    events_tx: mpsc::Sender<SessionEvent>,
    view_rx: watch::Receiver<SessionView>,
    notice_tx: broadcast::Sender<SessionNotice>,
}

impl SessionHandle {
    /// Send a user action into the session
    pub async fn act(&self, action: UserAction) {
        if self.events_tx.send(SessionEvent::Action(action)).await.is_err() {
            warn!("session runtime is gone; action dropped");
        }
    }

    /// Report the background track as ready
    pub async fn audio_ready(&self) {
        let _ = self.events_tx.send(SessionEvent::AudioLoaded).await;
    }

    /// Report the background track as failed
    pub async fn audio_failed(&self) {
        let _ = self.events_tx.send(SessionEvent::AudioFailed).await;
    }

    /// Current render snapshot
    pub fn view(&self) -> SessionView {
        self.view_rx.borrow().clone()
    }

    /// Watch render snapshots as they change
    pub fn watch(&self) -> watch::Receiver<SessionView> {
        self.view_rx.clone()
    }

    /// Subscribe to one-shot notices
    pub fn notices(&self) -> broadcast::Receiver<SessionNotice> {
        self.notice_tx.subscribe()
    }
}

/// The session actor
pub struct SessionRuntime {
    session: Session,
    session_config: SessionConfig,
    timers: HashMap<TimerRole, PhaseTimer>,
    dialogue: Arc<dyn DialogueClient>,
    audio: Arc<dyn AudioSink>,
    feedback: Arc<dyn FeedbackSink>,
    narrator: Arc<dyn Narrator>,
    events_tx: mpsc::Sender<SessionEvent>,
    events_rx: mpsc::Receiver<SessionEvent>,
    view_tx: watch::Sender<SessionView>,
    notice_tx: broadcast::Sender<SessionNotice>,
}

impl SessionRuntime {
    /// Create a runtime and the handle that drives it
    pub fn new(
        session_config: SessionConfig,
        dialogue: Arc<dyn DialogueClient>,
        audio: Arc<dyn AudioSink>,
        feedback: Arc<dyn FeedbackSink>,
    ) -> (Self, SessionHandle) {
        let session = Session::new(session_config.clone());
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (view_tx, view_rx) = watch::channel(session.view());
        let (notice_tx, _) = broadcast::channel(NOTICE_CHANNEL_CAPACITY);

        let handle = SessionHandle {
            events_tx: events_tx.clone(),
            view_rx,
            notice_tx: notice_tx.clone(),
        };

        let runtime = Self {
            session,
            session_config,
            timers: HashMap::new(),
            dialogue,
            audio,
            feedback,
            narrator: Arc::new(NullNarrator),
            events_tx,
            events_rx,
            view_tx,
            notice_tx,
        };

        (runtime, handle)
    }

    /// Replace the narrator used for induction cues
    pub fn with_narrator(mut self, narrator: Arc<dyn Narrator>) -> Self {
        self.narrator = narrator;
        self
    }

    /// Drive the session until the runtime task is dropped
    pub async fn run(mut self) {
        info!("session runtime started");
        let effects = self.session.bootstrap();
        self.execute(effects);
        self.publish();

        while let Some(event) = self.events_rx.recv().await {
            let previous_phase = self.session.phase();
            let effects = self.session.apply(event);
            self.execute(effects);

            let phase = self.session.phase();
            if phase != previous_phase {
                info!(from = ?previous_phase, to = ?phase, "phase transition");
                let _ = self.notice_tx.send(SessionNotice::PhaseChanged(phase));
            }
            self.publish();
        }
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        let mut queue: VecDeque<Effect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            debug!(?effect, "executing effect");
            match effect {
                Effect::StartTimer { role, interval } => self.start_timer(role, interval),
                Effect::CancelTimer(role) => {
                    if let Some(timer) = self.timers.get_mut(&role) {
                        timer.cancel();
                    }
                }
                Effect::PlayAudio { looped } => {
                    let audio = self.audio.clone();
                    let events_tx = self.events_tx.clone();
                    tokio::spawn(async move {
                        match audio.play(looped).await {
                            Ok(()) => {
                                let _ = events_tx.send(SessionEvent::AudioLoaded).await;
                            }
                            Err(error) => {
                                warn!(%error, "audio playback failed");
                                let _ = events_tx.send(SessionEvent::AudioFailed).await;
                            }
                        }
                    });
                }
                Effect::StopAudio => {
                    let audio = self.audio.clone();
                    tokio::spawn(async move {
                        audio.stop().await;
                    });
                }
                Effect::CallService(request) => {
                    let dialogue = self.dialogue.clone();
                    let events_tx = self.events_tx.clone();
                    tokio::spawn(async move {
                        let event = match dialogue.next_prompt(request).await {
                            Ok(reply) => SessionEvent::ServiceReplied(reply),
                            Err(error) => SessionEvent::ServiceFailed(error.to_string()),
                        };
                        let _ = events_tx.send(event).await;
                    });
                }
                Effect::SubmitFeedback { text } => {
                    let feedback = self.feedback.clone();
                    let report = FeedbackReport::collect(text);
                    tokio::spawn(async move {
                        feedback.deliver(report).await;
                    });
                }
                Effect::Narrate(cue) => self.narrator.announce(cue),
                Effect::NotifyInductionComplete => {
                    let _ = self.notice_tx.send(SessionNotice::InductionComplete);
                }
                Effect::Reset => queue.extend(self.reset_session()),
            }
        }
    }

    fn start_timer(&mut self, role: TimerRole, interval: std::time::Duration) {
        let events_tx = self.events_tx.clone();
        let timer = self.timers.entry(role).or_default();
        timer.start(
            interval,
            move |_elapsed| {
                // The session counts elapsed time itself; a full channel only
                // means the session is wedged, so the tick is dropped
                if let Err(error) = events_tx.try_send(SessionEvent::Tick(role)) {
                    warn!(?role, %error, "tick dropped");
                }
                TickOutcome::Continue
            },
            || {},
        );
    }

    /// Discard all in-memory state and start a fresh session
    fn reset_session(&mut self) -> Vec<Effect> {
        info!("resetting session");
        for timer in self.timers.values_mut() {
            timer.cancel();
        }
        let audio = self.audio.clone();
        tokio::spawn(async move {
            audio.stop().await;
        });

        self.session = Session::new(self.session_config.clone());
        let _ = self.notice_tx.send(SessionNotice::SessionReset);
        self.session.bootstrap()
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.session.view());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NullAudioSink;
    use crate::dialogue::{DialogueReply, MockDialogueClient};
    use crate::feedback::NullFeedbackSink;

    fn reply(question: &str, should_end: bool) -> DialogueReply {
        DialogueReply {
            question: question.to_string(),
            should_end,
            reasoning: String::new(),
        }
    }

    fn spawn_runtime(replies: Vec<DialogueReply>) -> SessionHandle {
        let dialogue = Arc::new(MockDialogueClient::new(replies));
        let audio = Arc::new(NullAudioSink::new("https://cdn.example.com/calm.mp3"));
        let (runtime, handle) = SessionRuntime::new(SessionConfig::default(), dialogue, audio, Arc::new(NullFeedbackSink));
        tokio::spawn(runtime.run());
        handle
    }

    #[tokio::test(start_paused = true)]
    async fn induction_and_prelude_advance_on_real_timers() {
        let handle = spawn_runtime(vec![reply("How are you?", false)]);
        let mut notices = handle.notices();
        let mut view = handle.watch();

        // 3 cycles at 4s per sub-phase plus the 2s settle
        let snapshot = view
            .wait_for(|v| v.phase == Phase::PreludeInterlude)
            .await
            .expect("prelude reached")
            .clone();
        assert!(snapshot.interlude.is_some());

        assert_eq!(notices.recv().await.unwrap(), SessionNotice::InductionComplete);

        // The 55s countdown expires into the conversation and the opening
        // question arrives
        let snapshot = view
            .wait_for(|v| v.phase == Phase::Conversation && !v.current_question.is_empty())
            .await
            .expect("conversation reached")
            .clone();
        assert_eq!(snapshot.current_question, "How are you?");
    }

    #[tokio::test(start_paused = true)]
    async fn skip_shortcuts_the_prelude() {
        let handle = spawn_runtime(vec![reply("Opening?", false)]);
        let mut view = handle.watch();

        view.wait_for(|v| v.phase == Phase::PreludeInterlude)
            .await
            .expect("prelude reached");

        // A host-reported audio failure is a soft notice, not a blocker
        handle.audio_failed().await;
        let snapshot = view
            .wait_for(|v| v.interlude.as_ref().is_some_and(|i| i.audio_errored))
            .await
            .expect("audio failure recorded")
            .clone();
        assert_eq!(snapshot.phase, Phase::PreludeInterlude);

        handle.act(UserAction::SkipInterlude).await;
        let snapshot = view
            .wait_for(|v| v.phase == Phase::Conversation && !v.current_question.is_empty())
            .await
            .expect("conversation reached")
            .clone();
        assert_eq!(snapshot.current_question, "Opening?");
    }

    #[tokio::test(start_paused = true)]
    async fn reset_rebuilds_the_session_from_the_top() {
        let handle = spawn_runtime(vec![reply("Q1", false), reply("", true)]);
        let mut view = handle.watch();
        let mut notices = handle.notices();

        view.wait_for(|v| v.phase == Phase::PreludeInterlude)
            .await
            .expect("prelude reached");
        handle.act(UserAction::SkipInterlude).await;
        view.wait_for(|v| v.phase == Phase::Conversation && !v.current_question.is_empty())
            .await
            .expect("conversation reached");

        handle.act(UserAction::SubmitTurn("I'm done".to_string())).await;
        view.wait_for(|v| v.phase == Phase::SessionEnded)
            .await
            .expect("session ended");

        handle.act(UserAction::GoToFeedback).await;
        handle.act(UserAction::SubmitFeedback("lovely".to_string())).await;
        view.wait_for(|v| v.phase == Phase::FeedbackSubmitted)
            .await
            .expect("feedback submitted");

        handle.act(UserAction::NewSession).await;
        let snapshot = view
            .wait_for(|v| v.phase == Phase::InitialBreathing && v.transcript_len == 0)
            .await
            .expect("session reset")
            .clone();
        assert!(!snapshot.session_ended);

        // The reset notice fires alongside the earlier one-shots
        let mut saw_reset = false;
        while let Ok(notice) = notices.try_recv() {
            if notice == SessionNotice::SessionReset {
                saw_reset = true;
            }
        }
        assert!(saw_reset);
    }
}
