//! Work queue between the batcher and the prober pool.
//!
//! The transport is at-least-once and unordered: publishers hand over batches
//! of caller-identified entries and get back the subset that failed to enqueue,
//! consumers receive deliveries of one or more messages.

pub mod channel;

pub use channel::{ChannelQueue, DeliveryReceiver, channel};

use std::collections::HashSet;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::QueueError;

/// Per-call entry limit of a batch publish
pub const MAX_BATCH_ENTRIES: usize = 10;

/// One entry of a batch publish
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Caller-assigned, unique within its batch
    pub id: String,
    pub body: String,
}

/// An entry the transport refused to enqueue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedEntry {
    pub id: String,
    pub reason: String,
}

impl fmt::Display for FailedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.reason)
    }
}

/// A message as seen by a consumer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub message_id: Uuid,
    pub body: String,
}

impl QueueMessage {
    pub fn new(body: impl Into<String>) -> Self {
        Self { message_id: Uuid::new_v4(), body: body.into() }
    }
}

/// One or more messages handed to a consumer in a single call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delivery {
    pub messages: Vec<QueueMessage>,
}

impl Delivery {
    pub fn from_bodies<I, S>(bodies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { messages: bodies.into_iter().map(QueueMessage::new).collect() }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Publishing side of the transport
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Publish a batch; returns the entries that could not be enqueued.
    ///
    /// A batch that breaks the transport limits is rejected as a whole.
    async fn send_batch(&self, entries: Vec<QueueEntry>) -> Result<Vec<FailedEntry>, QueueError>;
}

/// Check a batch against the transport limits
pub fn check_batch(entries: &[QueueEntry]) -> Result<(), QueueError> {
    if entries.is_empty() {
        return Err(QueueError::EmptyBatch);
    }

    if entries.len() > MAX_BATCH_ENTRIES {
        return Err(QueueError::BatchTooLarge(entries.len()));
    }

    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        if entry.id.is_empty() || !seen.insert(entry.id.as_str()) {
            return Err(QueueError::InvalidEntryId(entry.id.clone()));
        }
    }

    Ok(())
}
