use std::time::Duration;

use thiserror::Error;

/// Rejections raised before any store or queue interaction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("URL is required!")]
    Missing,

    #[error("Invalid URL format: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("URL already exists: {0}")]
    AlreadyExists(String),

    #[error("URL not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Store query failed: {0}")]
    Query(#[from] libsql::Error),

    #[error("Store connection unavailable: {0}")]
    Pool(String),

    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Stored record is malformed: {0}")]
    Malformed(String),
}

impl RegistryError {
    /// Conflicts are user-actionable outcomes, everything else is infrastructure
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::AlreadyExists(_) | Self::NotFound(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("Batch is empty")]
    EmptyBatch,

    #[error("Batch of {0} entries exceeds the per-call limit")]
    BatchTooLarge(usize),

    #[error("Invalid or duplicate entry id: {0:?}")]
    InvalidEntryId(String),

    #[error("Queue is closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Failed to scan the registry: {0}")]
    Scan(#[source] RegistryError),
}
