//! Session aggregate and transition logic
//!
//! The whole session is one explicit `Session` value; every transition is
//! `apply(event) -> effects`, a synchronous function over state that returns
//! the side effects the runtime must perform (start or cancel timers, drive
//! audio, call the service, deliver feedback). Nothing in this module touches
//! a clock or a socket, which is what makes the transition graph testable on
//! its own.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::breathing::{CountdownTick, ExtendedRun, InductionRun, InductionTick, SubPhase};
use crate::config::SessionConfig;
use crate::conversation::ConversationLoop;
use crate::dialogue::{DialogueReply, DialogueRequest};
use crate::interlude::{InterludeRun, InterludeTick, InterludeView};
use crate::narration::NarrationCue;

use super::Phase;

/// Timer roles owned by the session; at most one timer runs per role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerRole {
    /// Induction sub-phase alternation
    InductionBreath,
    /// One-shot settle delay after the induction completes
    InductionSettle,
    /// Extended-breathing sub-phase alternation
    SubPhaseFlip,
    /// Extended-breathing per-second sub-phase progress
    SubPhaseProgress,
    /// Extended-breathing overall countdown
    OverallCountdown,
    /// Interlude countdown
    MusicCountdown,
}

/// Everything that can happen to a session
#[derive(Debug)]
pub enum SessionEvent {
    /// One tick elapsed on the given timer role
    Tick(TimerRole),
    /// A user action arrived from the host
    Action(UserAction),
    /// The background track became ready
    AudioLoaded,
    /// The background track failed to load or play
    AudioFailed,
    /// The dialogue service replied
    ServiceReplied(DialogueReply),
    /// The dialogue service call failed (transport or parse)
    ServiceFailed(String),
}

/// User actions exposed by the host
#[derive(Debug, Clone, PartialEq)]
pub enum UserAction {
    /// Skip the prelude countdown straight to the conversation
    SkipInterlude,
    /// Manually start the background track
    StartMusic,
    /// Submit a conversation reply
    SubmitTurn(String),
    /// Close the conversation without waiting for the service
    CloseSession,
    /// Start the extended breathing exercise
    StartExtendedBreathing,
    /// Move to the feedback step
    GoToFeedback,
    /// Submit feedback text
    SubmitFeedback(String),
    /// Discard everything and start over
    NewSession,
}

/// Side effects returned by `Session::apply`, executed by the runtime
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    StartTimer { role: TimerRole, interval: Duration },
    CancelTimer(TimerRole),
    PlayAudio { looped: bool },
    StopAudio,
    CallService(DialogueRequest),
    SubmitFeedback { text: String },
    Narrate(NarrationCue),
    NotifyInductionComplete,
    Reset,
}

/// The aggregate root: one session, no persistence
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    phase: Phase,
    conversation: ConversationLoop,
    induction: Option<InductionRun>,
    extended: Option<ExtendedRun>,
    interlude: Option<InterludeRun>,
    induction_notified: bool,
}

impl Session {
    /// Create a session with a freshly drawn exit threshold
    pub fn new(config: SessionConfig) -> Self {
        let threshold = ConversationLoop::draw_exit_threshold(&config.exit_thresholds);
        Self::with_exit_threshold(config, threshold)
    }

    /// Create a session with a fixed exit threshold
    pub fn with_exit_threshold(config: SessionConfig, exit_threshold: u32) -> Self {
        let induction = InductionRun::new(config.induction_cycles, config.induction_hold);
        Self {
            conversation: ConversationLoop::new(exit_threshold),
            induction: Some(induction),
            extended: None,
            interlude: None,
            phase: Phase::InitialBreathing,
            induction_notified: false,
            config,
        }
    }

    /// Effects that put the freshly created session in motion
    pub fn bootstrap(&self) -> Vec<Effect> {
        vec![
            Effect::StartTimer {
                role: TimerRole::InductionBreath,
                interval: self.sub_phase_interval(),
            },
            Effect::Narrate(NarrationCue::SettleIn),
            Effect::Narrate(NarrationCue::BreatheIn),
        ]
    }

    /// Apply one event and return the side effects to perform
    pub fn apply(&mut self, event: SessionEvent) -> Vec<Effect> {
        match event {
            SessionEvent::Tick(role) => self.on_tick(role),
            SessionEvent::Action(action) => self.on_action(action),
            SessionEvent::AudioLoaded => {
                if let Some(run) = &mut self.interlude {
                    run.note_audio_ready();
                }
                Vec::new()
            }
            SessionEvent::AudioFailed => {
                if let Some(run) = &mut self.interlude {
                    run.note_audio_error();
                }
                Vec::new()
            }
            SessionEvent::ServiceReplied(reply) => self.on_service_reply(reply),
            SessionEvent::ServiceFailed(error) => {
                warn!(%error, "dialogue service call failed");
                if self.phase == Phase::Conversation {
                    self.conversation.apply_failure();
                }
                Vec::new()
            }
        }
    }

    fn on_tick(&mut self, role: TimerRole) -> Vec<Effect> {
        match (self.phase, role) {
            (Phase::InitialBreathing, TimerRole::InductionBreath) => {
                let Some(run) = &mut self.induction else {
                    return Vec::new();
                };
                match run.on_breath_tick() {
                    InductionTick::Advance(sub) => vec![Effect::Narrate(cue_for(sub))],
                    InductionTick::CycleComplete(_) => vec![Effect::Narrate(NarrationCue::BreatheIn)],
                    InductionTick::Finished => vec![
                        Effect::CancelTimer(TimerRole::InductionBreath),
                        Effect::Narrate(NarrationCue::CyclesComplete),
                        Effect::StartTimer {
                            role: TimerRole::InductionSettle,
                            interval: Duration::from_secs(self.config.settle_secs),
                        },
                    ],
                }
            }
            (Phase::InitialBreathing, TimerRole::InductionSettle) => self.enter_prelude(),
            (Phase::PreludeInterlude, TimerRole::MusicCountdown) => {
                let Some(run) = &mut self.interlude else {
                    return Vec::new();
                };
                match run.on_tick() {
                    InterludeTick::Continue(_) | InterludeTick::Ignored => Vec::new(),
                    // Natural expiry advances without forcing the audio off
                    InterludeTick::Finished => self.enter_conversation(false),
                }
            }
            (Phase::ExtendedBreathing, TimerRole::SubPhaseProgress) => {
                if let Some(run) = &mut self.extended {
                    run.on_progress_tick();
                }
                Vec::new()
            }
            (Phase::ExtendedBreathing, TimerRole::SubPhaseFlip) => {
                if let Some(run) = &mut self.extended {
                    run.on_flip_tick();
                }
                Vec::new()
            }
            (Phase::ExtendedBreathing, TimerRole::OverallCountdown) => {
                let Some(run) = &mut self.extended else {
                    return Vec::new();
                };
                match run.on_countdown_tick() {
                    CountdownTick::Continue(_) => Vec::new(),
                    CountdownTick::Finished => self.enter_postlude(),
                }
            }
            (phase, role) => {
                debug!(?phase, ?role, "stray tick dropped");
                Vec::new()
            }
        }
    }

    fn on_action(&mut self, action: UserAction) -> Vec<Effect> {
        match (self.phase, action) {
            (Phase::PreludeInterlude, UserAction::SkipInterlude) => self.enter_conversation(true),
            (Phase::PreludeInterlude, UserAction::StartMusic) => self.manual_music_start(false),
            (Phase::PostludeInterlude, UserAction::StartMusic) => self.manual_music_start(true),
            (Phase::Conversation, UserAction::SubmitTurn(text)) => self
                .conversation
                .submit(&text)
                .map(Effect::CallService)
                .into_iter()
                .collect(),
            // The close and new-session controls only exist once the exit
            // threshold has revealed them
            (Phase::Conversation, UserAction::CloseSession) if self.conversation.exit_revealed() => {
                self.conversation.close();
                self.phase = Phase::SessionEnded;
                vec![Effect::StopAudio]
            }
            (Phase::Conversation, UserAction::NewSession) if self.conversation.exit_revealed() => {
                vec![Effect::Reset]
            }
            (Phase::SessionEnded, UserAction::StartExtendedBreathing) => self.enter_extended(),
            (Phase::SessionEnded, UserAction::GoToFeedback) => {
                self.phase = Phase::Feedback;
                Vec::new()
            }
            (Phase::PostludeInterlude, UserAction::GoToFeedback) => {
                self.phase = Phase::Feedback;
                self.interlude = None;
                vec![Effect::StopAudio]
            }
            (Phase::Feedback, UserAction::SubmitFeedback(text)) => {
                let text = text.trim();
                if text.is_empty() {
                    return Vec::new();
                }
                self.phase = Phase::FeedbackSubmitted;
                vec![Effect::SubmitFeedback { text: text.to_string() }]
            }
            (Phase::FeedbackSubmitted, UserAction::NewSession) => vec![Effect::Reset],
            (phase, action) => {
                debug!(?phase, ?action, "action not available in this phase");
                Vec::new()
            }
        }
    }

    fn on_service_reply(&mut self, reply: DialogueReply) -> Vec<Effect> {
        if self.phase != Phase::Conversation {
            debug!(phase = ?self.phase, "stray service reply dropped");
            return Vec::new();
        }
        if self.conversation.apply_reply(&reply) {
            self.phase = Phase::SessionEnded;
        }
        Vec::new()
    }

    fn enter_prelude(&mut self) -> Vec<Effect> {
        self.phase = Phase::PreludeInterlude;
        self.induction = None;
        self.interlude = Some(InterludeRun::countdown(self.config.prelude_secs));

        let mut effects = vec![
            Effect::CancelTimer(TimerRole::InductionBreath),
            Effect::CancelTimer(TimerRole::InductionSettle),
        ];
        if !self.induction_notified {
            self.induction_notified = true;
            effects.push(Effect::NotifyInductionComplete);
        }
        effects.push(Effect::PlayAudio { looped: false });
        effects.push(Effect::StartTimer {
            role: TimerRole::MusicCountdown,
            interval: Duration::from_secs(1),
        });
        effects
    }

    fn enter_conversation(&mut self, stop_audio: bool) -> Vec<Effect> {
        self.phase = Phase::Conversation;
        self.interlude = None;

        let mut effects = vec![Effect::CancelTimer(TimerRole::MusicCountdown)];
        if stop_audio {
            effects.push(Effect::StopAudio);
        }
        if let Some(request) = self.conversation.begin() {
            effects.push(Effect::CallService(request));
        }
        effects
    }

    fn enter_extended(&mut self) -> Vec<Effect> {
        self.phase = Phase::ExtendedBreathing;
        self.extended = Some(ExtendedRun::new(self.config.extended_secs, self.config.sub_phase_secs));

        // The three extended-breathing timers start as one batch; the matching
        // cancels guard against stray timers on re-entry
        vec![
            Effect::CancelTimer(TimerRole::SubPhaseFlip),
            Effect::CancelTimer(TimerRole::SubPhaseProgress),
            Effect::CancelTimer(TimerRole::OverallCountdown),
            Effect::StartTimer {
                role: TimerRole::SubPhaseFlip,
                interval: self.sub_phase_interval(),
            },
            Effect::StartTimer {
                role: TimerRole::SubPhaseProgress,
                interval: Duration::from_secs(1),
            },
            Effect::StartTimer {
                role: TimerRole::OverallCountdown,
                interval: Duration::from_secs(1),
            },
        ]
    }

    fn enter_postlude(&mut self) -> Vec<Effect> {
        self.phase = Phase::PostludeInterlude;
        self.extended = None;
        self.interlude = Some(InterludeRun::looping());

        // All three extended-breathing timers go down together
        vec![
            Effect::CancelTimer(TimerRole::SubPhaseFlip),
            Effect::CancelTimer(TimerRole::SubPhaseProgress),
            Effect::CancelTimer(TimerRole::OverallCountdown),
            Effect::PlayAudio { looped: true },
        ]
    }

    fn manual_music_start(&mut self, looped: bool) -> Vec<Effect> {
        match &self.interlude {
            Some(run) if run.offers_manual_start() => vec![Effect::PlayAudio { looped }],
            _ => Vec::new(),
        }
    }

    fn sub_phase_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.config.sub_phase_secs))
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn conversation(&self) -> &ConversationLoop {
        &self.conversation
    }

    /// Render snapshot for the host
    pub fn view(&self) -> SessionView {
        let breathing = match self.phase {
            Phase::InitialBreathing => self.induction.as_ref().map(|run| BreathingView::Induction {
                sub_phase: run.sub_phase(),
                cycles_completed: run.cycles_completed(),
                max_cycles: run.max_cycles(),
            }),
            Phase::ExtendedBreathing => self.extended.as_ref().map(|run| BreathingView::Extended {
                sub_phase: run.sub_phase(),
                sub_phase_timer: run.sub_phase_timer(),
                progress_percent: run.progress_percent(),
                remaining: run.remaining(),
            }),
            _ => None,
        };

        SessionView {
            phase: self.phase,
            current_question: self.conversation.current_question().to_string(),
            last_user_response: self.conversation.last_user_response().to_string(),
            awaiting_reply: self.conversation.awaiting_reply(),
            session_ended: self.conversation.is_ended(),
            exit_revealed: self.conversation.exit_revealed(),
            transcript_len: self.conversation.transcript().len(),
            breathing,
            interlude: self.interlude.as_ref().map(InterludeRun::view),
        }
    }
}

fn cue_for(sub_phase: SubPhase) -> NarrationCue {
    match sub_phase {
        SubPhase::Inhale => NarrationCue::BreatheIn,
        SubPhase::Hold => NarrationCue::Hold,
        SubPhase::Exhale => NarrationCue::BreatheOut,
    }
}

/// Breathing snapshot for the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "mode")]
pub enum BreathingView {
    Induction {
        sub_phase: SubPhase,
        cycles_completed: u32,
        max_cycles: u32,
    },
    Extended {
        sub_phase: SubPhase,
        sub_phase_timer: u32,
        progress_percent: u32,
        remaining: u32,
    },
}

/// Render snapshot of the whole session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub phase: Phase,
    pub current_question: String,
    pub last_user_response: String,
    pub awaiting_reply: bool,
    pub session_ended: bool,
    pub exit_revealed: bool,
    pub transcript_len: usize,
    pub breathing: Option<BreathingView>,
    pub interlude: Option<InterludeView>,
}
