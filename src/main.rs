//! Shanti - guided wellbeing session
//!
//! Terminal host: wires the session runtime to the HTTP dialogue service and
//! drives it with line input. Presentation here is deliberately thin; the
//! session itself lives in the library.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::{mpsc, watch};
use tracing::info;

use shanti::audio::NullAudioSink;
use shanti::cli::Cli;
use shanti::config::Config;
use shanti::dialogue::HttpDialogueClient;
use shanti::feedback::HttpFeedbackSink;
use shanti::narration::{NarrationCue, Narrator};
use shanti::session::{BreathingView, Phase, SessionHandle, SessionRuntime, SessionView, UserAction};

fn setup_logging(verbose: bool) -> Result<()> {
    // Write to a log file, not stdout - the terminal belongs to the session
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shanti")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file = fs::File::create(log_dir.join("shanti.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

/// Narrator that speaks through the terminal
struct PrintNarrator;

impl Narrator for PrintNarrator {
    fn announce(&self, cue: NarrationCue) {
        println!("  {}", cue.line().italic().dimmed());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(endpoint = %config.dialogue.endpoint, "configuration loaded");

    let dialogue = Arc::new(HttpDialogueClient::from_config(&config.dialogue)?);
    let audio = Arc::new(NullAudioSink::new(config.audio.track_url.clone()));
    let feedback = Arc::new(HttpFeedbackSink::from_config(&config.feedback)?);

    let (runtime, handle) = SessionRuntime::new(config.session.clone(), dialogue, audio, feedback);
    let runtime = runtime.with_narrator(Arc::new(PrintNarrator));
    tokio::spawn(runtime.run());

    run_host(handle).await
}

async fn run_host(handle: SessionHandle) -> Result<()> {
    println!("{}", "shanti".bold());
    println!("{}", "Settle in. Type /quit to leave at any time.".dimmed());
    println!();

    let renderer = tokio::spawn(render_loop(handle.watch()));

    let (line_tx, mut line_rx) = mpsc::channel::<String>(16);
    std::thread::spawn(move || read_lines(line_tx));

    while let Some(line) = line_rx.recv().await {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('/') {
            match command {
                "quit" => break,
                "skip" => handle.act(UserAction::SkipInterlude).await,
                "music" => handle.act(UserAction::StartMusic).await,
                "close" => handle.act(UserAction::CloseSession).await,
                "breathe" => handle.act(UserAction::StartExtendedBreathing).await,
                "feedback" => handle.act(UserAction::GoToFeedback).await,
                "new" => handle.act(UserAction::NewSession).await,
                other => println!("{}", format!("Unknown command: /{other}").red()),
            }
            continue;
        }

        match handle.view().phase {
            Phase::Conversation => handle.act(UserAction::SubmitTurn(line)).await,
            Phase::Feedback => handle.act(UserAction::SubmitFeedback(line)).await,
            _ => println!("{}", "Nothing to type right now - just breathe.".dimmed()),
        }
    }

    renderer.abort();
    println!("{}", "Take care.".dimmed());
    Ok(())
}

fn read_lines(tx: mpsc::Sender<String>) {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(error) => {
            eprintln!("Failed to initialize readline: {error}");
            return;
        }
    };

    loop {
        match editor.readline("") {
            Ok(line) => {
                let _ = editor.add_history_entry(&line);
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
            }
            Err(ReadlineError::Eof) => {
                let _ = tx.blocking_send("/quit".to_string());
                break;
            }
            Err(error) => {
                eprintln!("Readline error: {error}");
                break;
            }
        }
    }
}

async fn render_loop(mut view_rx: watch::Receiver<SessionView>) {
    let mut last = view_rx.borrow().clone();
    render_phase(&last);

    while view_rx.changed().await.is_ok() {
        let next = view_rx.borrow().clone();
        render_delta(&last, &next);
        last = next;
    }
}

fn render_phase(view: &SessionView) {
    println!();
    println!("{}", format!("· {} ·", view.phase.display_name()).bright_cyan().bold());
    match view.phase {
        Phase::InitialBreathing => {
            println!("{}", "Three slow breaths before we begin.".dimmed());
        }
        Phase::PreludeInterlude => {
            println!("{}", "A moment of peaceful music.".dimmed());
            println!("{}", "/skip to continue, /music if it does not start".dimmed());
        }
        Phase::Conversation => {}
        Phase::SessionEnded => {
            println!("{}", "/breathe for a three-minute exercise, /feedback to wrap up".dimmed());
        }
        Phase::ExtendedBreathing => {
            println!("{}", "Follow the rhythm. Three minutes.".dimmed());
        }
        Phase::PostludeInterlude => {
            println!("{}", "Rest with the music. /feedback when you are ready".dimmed());
        }
        Phase::Feedback => {
            println!("{}", "How was this session for you? Type your thoughts.".dimmed());
        }
        Phase::FeedbackSubmitted => {
            println!("{}", "Thank you - your feedback helps. /new to start again".dimmed());
        }
    }
}

fn render_delta(last: &SessionView, next: &SessionView) {
    if next.phase != last.phase {
        render_phase(next);
    }

    if next.current_question != last.current_question && !next.current_question.is_empty() {
        if !next.last_user_response.is_empty() {
            println!("{}", format!("\"{}\"", next.last_user_response).dimmed());
        }
        println!();
        println!("{}", next.current_question.bold());
    }

    if next.exit_revealed && !last.exit_revealed {
        println!("{}", "/new and /close are now available".dimmed());
    }

    if let (Some(BreathingView::Induction { cycles_completed, max_cycles, .. }), Some(BreathingView::Induction { cycles_completed: last_cycles, .. })) =
        (&next.breathing, &last.breathing)
        && cycles_completed != last_cycles
    {
        println!("{}", format!("{cycles_completed}/{max_cycles} breaths complete").dimmed());
    }

    if let Some(BreathingView::Extended { sub_phase, remaining, .. }) = &next.breathing {
        let flipped = !matches!(
            &last.breathing,
            Some(BreathingView::Extended { sub_phase: prev, .. }) if prev == sub_phase
        );
        if flipped {
            let line = match sub_phase {
                shanti::SubPhase::Inhale => "Breathe in...",
                shanti::SubPhase::Hold => "Hold...",
                shanti::SubPhase::Exhale => "Breathe out...",
            };
            println!("  {} {}", line.bright_white(), format!("({} left)", format_clock(*remaining)).dimmed());
        }
    }

    if let Some(interlude) = &next.interlude
        && let Some(remaining) = interlude.remaining
        && remaining % 10 == 0
        && remaining > 0
        && last.interlude.as_ref().and_then(|i| i.remaining) != Some(remaining)
    {
        println!("{}", format!("{remaining}s of music remaining").dimmed());
    }

    if let Some(interlude) = &next.interlude
        && interlude.audio_errored
        && !last.interlude.as_ref().is_some_and(|i| i.audio_errored)
    {
        println!("{}", "The music could not be played - you can still continue.".yellow());
    }
}

fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
