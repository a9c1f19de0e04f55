//! End-to-end session flow
//!
//! Drives a full session through the public runtime handle with a scripted
//! dialogue service and a recording feedback sink, on a paused clock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use shanti::audio::NullAudioSink;
use shanti::config::SessionConfig;
use shanti::dialogue::{DialogueClient, DialogueError, DialogueReply, DialogueRequest};
use shanti::feedback::{FeedbackReport, FeedbackSink};
use shanti::session::{Phase, SessionRuntime, UserAction};

struct ScriptedDialogue {
    replies: Vec<DialogueReply>,
    calls: AtomicUsize,
}

impl ScriptedDialogue {
    fn new(replies: Vec<DialogueReply>) -> Self {
        Self {
            replies,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl DialogueClient for ScriptedDialogue {
    async fn next_prompt(&self, _request: DialogueRequest) -> Result<DialogueReply, DialogueError> {
        let idx = self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .get(idx)
            .cloned()
            .ok_or_else(|| DialogueError::InvalidReply("script exhausted".to_string()))
    }
}

#[derive(Default)]
struct RecordingFeedbackSink {
    reports: Mutex<Vec<FeedbackReport>>,
}

#[async_trait]
impl FeedbackSink for RecordingFeedbackSink {
    async fn deliver(&self, report: FeedbackReport) {
        self.reports.lock().unwrap().push(report);
    }
}

fn reply(question: &str, should_end: bool) -> DialogueReply {
    DialogueReply {
        question: question.to_string(),
        should_end,
        reasoning: String::new(),
    }
}

#[tokio::test(start_paused = true)]
async fn full_session_walkthrough() {
    // Opening, eight ordinary turns, then the end signal on the ninth
    let mut replies = vec![reply("How are you?", false), reply("What made today okay?", false)];
    for n in 3..=9 {
        replies.push(reply(&format!("Q{n}"), false));
    }
    replies.push(reply("", true));

    let dialogue = Arc::new(ScriptedDialogue::new(replies));
    let audio = Arc::new(NullAudioSink::new("https://cdn.example.com/calm.mp3"));
    let feedback = Arc::new(RecordingFeedbackSink::default());

    let (runtime, handle) =
        SessionRuntime::new(SessionConfig::default(), dialogue, audio, feedback.clone());
    tokio::spawn(runtime.run());
    let mut view = handle.watch();

    // Induction (3 cycles of 4s sub-phases plus the settle) and the 55s
    // prelude elapse on the paused clock; the opening question arrives
    let snapshot = view
        .wait_for(|v| v.phase == Phase::Conversation && v.current_question == "How are you?")
        .await
        .expect("conversation reached")
        .clone();
    assert_eq!(snapshot.transcript_len, 0);

    handle.act(UserAction::SubmitTurn("I'm okay".to_string())).await;
    let snapshot = view
        .wait_for(|v| v.current_question == "What made today okay?")
        .await
        .expect("second prompt")
        .clone();
    assert_eq!(snapshot.transcript_len, 2);

    // Six round-trips is below either exit-threshold candidate
    for n in 2usize..=6 {
        handle.act(UserAction::SubmitTurn(format!("answer {n}"))).await;
        view.wait_for(|v| v.transcript_len == 2 * n && !v.awaiting_reply)
            .await
            .expect("turn applied");
    }
    assert!(!view.borrow().exit_revealed);

    // Eight round-trips is at or past both candidates
    for n in 7usize..=8 {
        handle.act(UserAction::SubmitTurn(format!("answer {n}"))).await;
        view.wait_for(|v| v.transcript_len == 2 * n && !v.awaiting_reply)
            .await
            .expect("turn applied");
    }
    assert!(view.borrow().exit_revealed);

    // The ninth turn draws the end signal
    handle.act(UserAction::SubmitTurn("I feel settled now".to_string())).await;
    let snapshot = view
        .wait_for(|v| v.phase == Phase::SessionEnded)
        .await
        .expect("session ended")
        .clone();
    assert!(snapshot.session_ended);
    assert_eq!(snapshot.current_question, "");
    assert!(snapshot.exit_revealed);

    // The full 180s exercise runs, then the looping postlude
    handle.act(UserAction::StartExtendedBreathing).await;
    view.wait_for(|v| v.phase == Phase::ExtendedBreathing)
        .await
        .expect("extended breathing started");
    view.wait_for(|v| v.phase == Phase::PostludeInterlude)
        .await
        .expect("postlude reached");

    handle.act(UserAction::GoToFeedback).await;
    view.wait_for(|v| v.phase == Phase::Feedback).await.expect("feedback phase");

    handle.act(UserAction::SubmitFeedback("calming".to_string())).await;
    view.wait_for(|v| v.phase == Phase::FeedbackSubmitted)
        .await
        .expect("feedback submitted");

    // Delivery is fire-and-forget; give the spawned task a chance to land
    for _ in 0..16 {
        if !feedback.reports.lock().unwrap().is_empty() {
            break;
        }
        tokio::task::yield_now().await;
    }
    let reports = feedback.reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].feedback, "calming");
}

#[tokio::test(start_paused = true)]
async fn service_outage_never_ends_the_session() {
    // Script exhausts immediately: every call fails
    let dialogue = Arc::new(ScriptedDialogue::new(vec![]));
    let audio = Arc::new(NullAudioSink::new("https://cdn.example.com/calm.mp3"));
    let feedback = Arc::new(RecordingFeedbackSink::default());

    let (runtime, handle) =
        SessionRuntime::new(SessionConfig::default(), dialogue, audio, feedback);
    tokio::spawn(runtime.run());
    let mut view = handle.watch();

    view.wait_for(|v| v.phase == Phase::PreludeInterlude)
        .await
        .expect("prelude reached");
    handle.act(UserAction::SkipInterlude).await;

    // The failed opening call degrades to the local prompt
    let snapshot = view
        .wait_for(|v| v.phase == Phase::Conversation && !v.current_question.is_empty())
        .await
        .expect("fallback prompt")
        .clone();
    assert_eq!(snapshot.current_question, "How are you feeling today?");
    assert!(!snapshot.session_ended);

    // A failed turn keeps the conversation alive too
    handle.act(UserAction::SubmitTurn("still here".to_string())).await;
    let snapshot = view
        .wait_for(|v| v.current_question == "Tell me more about that.")
        .await
        .expect("turn fallback")
        .clone();
    assert!(!snapshot.session_ended);
    assert_eq!(snapshot.transcript_len, 2);
}
