//! Configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Conversational-response service
    pub dialogue: DialogueConfig,

    /// Feedback endpoint
    pub feedback: FeedbackConfig,

    /// Background audio
    pub audio: AudioConfig,

    /// Session phase timings and thresholds
    pub session: SessionConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .shanti.yml
        let local_config = PathBuf::from(".shanti.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/shanti/shanti.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("shanti").join("shanti.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Conversational-response service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    /// Endpoint receiving the transcript
    pub endpoint: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3000/api/therapy".to_string(),
            timeout_ms: 30_000,
        }
    }
}

/// Feedback endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Endpoint receiving feedback reports
    pub endpoint: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3000/api/feedback".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Background audio configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// URL of the ambient track
    #[serde(rename = "track-url")]
    pub track_url: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            track_url: "https://cdn.example.com/peaceful-music.mp3".to_string(),
        }
    }
}

/// Session phase timings and thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Induction breath cycles before the session proper
    #[serde(rename = "induction-cycles")]
    pub induction_cycles: u32,

    /// Whether the induction holds between inhale and exhale
    #[serde(rename = "induction-hold")]
    pub induction_hold: bool,

    /// Length of one breathing sub-phase in seconds
    #[serde(rename = "sub-phase-secs")]
    pub sub_phase_secs: u32,

    /// Pause after the induction completes, in seconds
    #[serde(rename = "settle-secs")]
    pub settle_secs: u64,

    /// Total length of the extended breathing exercise in seconds
    #[serde(rename = "extended-secs")]
    pub extended_secs: u32,

    /// Pre-conversation interlude countdown in seconds
    #[serde(rename = "prelude-secs")]
    pub prelude_secs: u32,

    /// Equally likely exit-threshold candidates, in round-trips
    #[serde(rename = "exit-thresholds")]
    pub exit_thresholds: Vec<u32>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            induction_cycles: 3,
            induction_hold: false,
            sub_phase_secs: 4,
            settle_secs: 2,
            extended_secs: 180,
            prelude_secs: 55,
            exit_thresholds: vec![7, 8],
        }
    }
}
