use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Last-known liveness of a monitored site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SiteStatus {
    Unknown,
    Up,
    Down,
}

impl SiteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SiteStatus::Unknown => "UNKNOWN",
            SiteStatus::Up => "UP",
            SiteStatus::Down => "DOWN",
        }
    }
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseModelError {
    #[error("Unknown site status: {0}")]
    Status(String),

    #[error("Invalid last-checked value: {0}")]
    LastChecked(String),
}

impl FromStr for SiteStatus {
    type Err = ParseModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNKNOWN" => Ok(SiteStatus::Unknown),
            "UP" => Ok(SiteStatus::Up),
            "DOWN" => Ok(SiteStatus::Down),
            other => Err(ParseModelError::Status(other.to_string())),
        }
    }
}

/// Result of a completed probe. There is no way back to `Unknown` from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Liveness {
    Up,
    Down,
}

impl From<Liveness> for SiteStatus {
    fn from(liveness: Liveness) -> Self {
        match liveness {
            Liveness::Up => SiteStatus::Up,
            Liveness::Down => SiteStatus::Down,
        }
    }
}

impl fmt::Display for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        SiteStatus::from(*self).fmt(f)
    }
}

/// Time of the most recent probe, `Never` until the first one lands.
///
/// Ordered so that `Never` sorts before any timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum LastChecked {
    Never,
    At(DateTime<Utc>),
}

impl LastChecked {
    /// Milliseconds since the epoch, as persisted by the libsql registry
    pub fn as_millis(&self) -> Option<i64> {
        match self {
            LastChecked::Never => None,
            LastChecked::At(at) => Some(at.timestamp_millis()),
        }
    }

    pub fn from_millis(millis: Option<i64>) -> Result<Self, ParseModelError> {
        match millis {
            None => Ok(LastChecked::Never),
            Some(ms) => DateTime::from_timestamp_millis(ms)
                .map(LastChecked::At)
                .ok_or_else(|| ParseModelError::LastChecked(ms.to_string())),
        }
    }
}

impl fmt::Display for LastChecked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LastChecked::Never => f.write_str("NEVER"),
            LastChecked::At(at) => f.write_str(&at.to_rfc3339()),
        }
    }
}

impl From<LastChecked> for String {
    fn from(value: LastChecked) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for LastChecked {
    type Error = ParseModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == "NEVER" {
            return Ok(LastChecked::Never);
        }
        DateTime::parse_from_rfc3339(&value)
            .map(|at| LastChecked::At(at.with_timezone(&Utc)))
            .map_err(|_| ParseModelError::LastChecked(value))
    }
}

/// A registered URL and its last-known liveness
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MonitoredSite {
    /// Registry key, stored exactly as registered
    pub url: String,
    pub status: SiteStatus,
    pub last_checked: LastChecked,
}

impl MonitoredSite {
    /// Create a freshly registered site
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), status: SiteStatus::Unknown, last_checked: LastChecked::Never }
    }

    /// Apply a probe observation.
    ///
    /// Observations older than the stored one are dropped so `last_checked`
    /// never moves backwards. Returns whether the record changed.
    pub fn observe(&mut self, liveness: Liveness, at: DateTime<Utc>) -> bool {
        let observed = LastChecked::At(at);
        if observed < self.last_checked {
            return false;
        }
        self.status = liveness.into();
        self.last_checked = observed;
        true
    }
}
