//! Target and outcome model types.
//!
//! Field names on the wire match the persisted JSON shape (`interval`,
//! `isActive`, `logs`, `statusCode`, `latency`).

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

/// Maximum number of outcomes retained per target.
pub const HISTORY_CAPACITY: usize = 50;
/// Shortest allowed probe interval, in seconds.
pub const MIN_INTERVAL_SECS: u32 = 5;
/// Longest allowed probe interval, in seconds.
pub const MAX_INTERVAL_SECS: u32 = 3600;

pub type TargetId = String;

/// Rejected input when creating or retiming a target.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("unsupported URL scheme '{0}', expected http or https")]
    UnsupportedScheme(String),
    #[error("interval must be between 5 and 3600 seconds, got {0}")]
    IntervalOutOfRange(u32),
}

/// Stored result of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProbeStatus {
    Up,
    Down,
    Error,
}

impl ProbeStatus {
    /// Classify an HTTP status code. 200-399 counts as up.
    pub fn from_status_code(code: u16) -> Self {
        if (200..400).contains(&code) {
            ProbeStatus::Up
        } else {
            ProbeStatus::Down
        }
    }
}

/// One recorded probe result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    /// Epoch milliseconds at probe start.
    pub timestamp: i64,
    pub status: ProbeStatus,
    /// Present only when a response was received.
    pub status_code: Option<u16>,
    #[serde(rename = "latency")]
    pub latency_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Outcome {
    /// Outcome for a probe that got an HTTP response.
    pub fn response(timestamp: i64, status_code: u16, latency_ms: u64) -> Self {
        Self {
            timestamp,
            status: ProbeStatus::from_status_code(status_code),
            status_code: Some(status_code),
            latency_ms,
            message: None,
        }
    }

    /// Outcome for a probe that never got a response.
    pub fn error(timestamp: i64, latency_ms: u64, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            status: ProbeStatus::Error,
            status_code: None,
            latency_ms,
            message: Some(message.into()),
        }
    }
}

/// Bounded FIFO of outcomes, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Outcome>", into = "Vec<Outcome>")]
pub struct History(VecDeque<Outcome>);

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an outcome, evicting the oldest entries past capacity.
    pub fn append(&mut self, outcome: Outcome) {
        self.0.push_back(outcome);
        while self.0.len() > HISTORY_CAPACITY {
            self.0.pop_front();
        }
    }

    pub fn last(&self) -> Option<&Outcome> {
        self.0.back()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Outcome> + ExactSizeIterator {
        self.0.iter()
    }
}

impl From<Vec<Outcome>> for History {
    fn from(outcomes: Vec<Outcome>) -> Self {
        let mut history = History::new();
        for outcome in outcomes {
            history.append(outcome);
        }
        history
    }
}

impl From<History> for Vec<Outcome> {
    fn from(history: History) -> Self {
        history.0.into()
    }
}

/// A monitored endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub id: TargetId,
    pub name: String,
    pub url: String,
    #[serde(rename = "interval")]
    pub interval_secs: u32,
    pub is_active: bool,
    #[serde(rename = "logs", default)]
    pub history: History,
}

impl Target {
    /// A fresh, active target with empty history.
    pub fn new(id: TargetId, name: String, url: String, interval_secs: u32) -> Self {
        Self {
            id,
            name,
            url,
            interval_secs,
            is_active: true,
            history: History::new(),
        }
    }
}

/// Validate and normalize a display name.
pub fn validate_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(name.to_string())
}

/// Validate that the URL is an absolute http(s) URL.
pub fn validate_url(url: &str) -> Result<String, ValidationError> {
    let url = url.trim();
    let parsed = Url::parse(url).map_err(|e| ValidationError::InvalidUrl(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(url.to_string()),
        other => Err(ValidationError::UnsupportedScheme(other.to_string())),
    }
}

pub fn validate_interval(interval_secs: u32) -> Result<u32, ValidationError> {
    if (MIN_INTERVAL_SECS..=MAX_INTERVAL_SECS).contains(&interval_secs) {
        Ok(interval_secs)
    } else {
        Err(ValidationError::IntervalOutOfRange(interval_secs))
    }
}
