use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::models::Liveness;

/// Only this status code counts as reachable
pub const UP_STATUS_CODE: u16 = 200;

/// Classify an HTTP status code
pub fn classify(status_code: u16) -> Liveness {
    if status_code == UP_STATUS_CODE { Liveness::Up } else { Liveness::Down }
}

/// Result of a single liveness probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Target the request was sent to
    pub target: String,

    pub status: Liveness,

    /// HTTP status code, absent when no response arrived
    pub status_code: Option<u16>,

    /// Response time in milliseconds
    pub latency_ms: Option<u64>,

    /// Transport error (timeout, refused connection, ...)
    pub error: Option<String>,
}

impl ProbeOutcome {
    /// A response arrived; classify it by status code
    pub fn responded(target: String, status_code: u16, latency_ms: u64) -> Self {
        Self {
            target,
            status: classify(status_code),
            status_code: Some(status_code),
            latency_ms: Some(latency_ms),
            error: None,
        }
    }

    /// No response arrived; always `DOWN`
    pub fn unreachable(target: String, error: String) -> Self {
        Self { target, status: Liveness::Down, status_code: None, latency_ms: None, error: Some(error) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    InvalidUrl(ValidationError),
    StoreFailed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::InvalidUrl(e) => write!(f, "{e}"),
            SkipReason::StoreFailed(e) => write!(f, "failed to record status: {e}"),
        }
    }
}

/// What happened to one delivered message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    Recorded { url: String, status: Liveness, checked_at: DateTime<Utc> },
    Skipped { url: String, reason: SkipReason },
}

/// Per-message results of one delivery. The delivery itself always succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub outcomes: Vec<MessageOutcome>,
}

impl DeliveryReport {
    pub fn recorded(&self) -> usize {
        self.outcomes.iter().filter(|o| matches!(o, MessageOutcome::Recorded { .. })).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.recorded()
    }
}

/// A registry entry the batcher could not enqueue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedSite {
    /// Index of the batch the site belonged to
    pub batch: usize,
    pub url: String,
    pub reason: String,
}

/// Summary of one batcher invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Sites in the registry snapshot
    pub sites: usize,
    /// Publish calls made
    pub batches: usize,
    /// Sites enqueued successfully
    pub published: usize,
    pub failed: Vec<FailedSite>,
}
