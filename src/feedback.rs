//! Feedback sink
//!
//! Feedback is best-effort telemetry, not a core guarantee: delivery is
//! fire-and-forget, failures are logged and swallowed, and the user always
//! sees the submission as accepted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::FeedbackConfig;

/// Errors constructing a feedback sink
#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Payload posted to the feedback endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackReport {
    pub user_agent: String,
    pub platform: String,
    pub language: String,
    pub timestamp: DateTime<Utc>,
    pub feedback: String,
}

impl FeedbackReport {
    /// Capture host details for a feedback submission
    pub fn collect(feedback: impl Into<String>) -> Self {
        Self {
            user_agent: format!("shanti/{}", env!("CARGO_PKG_VERSION")),
            platform: std::env::consts::OS.to_string(),
            language: std::env::var("LANG").unwrap_or_else(|_| "unknown".to_string()),
            timestamp: Utc::now(),
            feedback: feedback.into(),
        }
    }
}

/// Best-effort feedback delivery
#[async_trait]
pub trait FeedbackSink: Send + Sync {
    /// Deliver a report; failures are logged, never surfaced
    async fn deliver(&self, report: FeedbackReport);
}

/// Sink posting reports to the configured endpoint
pub struct HttpFeedbackSink {
    endpoint: String,
    http: Client,
}

impl HttpFeedbackSink {
    pub fn from_config(config: &FeedbackConfig) -> Result<Self, FeedbackError> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            http,
        })
    }
}

#[async_trait]
impl FeedbackSink for HttpFeedbackSink {
    async fn deliver(&self, report: FeedbackReport) {
        match self.http.post(&self.endpoint).json(&report).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("feedback delivered");
            }
            Ok(response) => {
                warn!(status = %response.status(), "feedback endpoint rejected the report");
            }
            Err(error) => {
                warn!(%error, "feedback delivery failed");
            }
        }
    }
}

/// Sink for hosts without a feedback endpoint; logs and drops the report
pub struct NullFeedbackSink;

#[async_trait]
impl FeedbackSink for NullFeedbackSink {
    async fn deliver(&self, report: FeedbackReport) {
        debug!(chars = report.feedback.len(), "null feedback sink: report dropped");
    }
}
