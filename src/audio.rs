//! Audio sink boundary
//!
//! The session owns a single background track and drives it through this
//! trait. Playback always restarts from the beginning; `stop` pauses and
//! rewinds so the next `play` starts clean. Rendering the audio is the
//! host's concern.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// Errors surfaced by an audio sink
///
/// Always recovered as a soft inline notice; playback failure never blocks a
/// phase advance.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("track failed to load: {0}")]
    Load(String),

    #[error("playback failed: {0}")]
    Playback(String),
}

/// Playback control for the session's background track
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Rewind to the start and begin playback
    async fn play(&self, looped: bool) -> Result<(), AudioError>;

    /// Pause and rewind
    async fn stop(&self);
}

/// Sink for hosts without an audio device
///
/// Reports the track as ready immediately and plays nothing.
pub struct NullAudioSink {
    track_url: String,
}

impl NullAudioSink {
    pub fn new(track_url: impl Into<String>) -> Self {
        Self {
            track_url: track_url.into(),
        }
    }
}

#[async_trait]
impl AudioSink for NullAudioSink {
    async fn play(&self, looped: bool) -> Result<(), AudioError> {
        debug!(track = %self.track_url, looped, "null audio sink: play");
        Ok(())
    }

    async fn stop(&self) {
        debug!(track = %self.track_url, "null audio sink: stop");
    }
}
