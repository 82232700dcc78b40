use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::{
    self,
    error::{SendTimeoutError, TrySendError},
};

use super::{Delivery, FailedEntry, QueueEntry, QueueMessage, WorkQueue, check_batch};
use crate::error::QueueError;

/// Create an in-process queue holding at most `capacity` undelivered messages
pub fn channel(capacity: usize) -> (ChannelQueue, DeliveryReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ChannelQueue { tx, publish_timeout: Duration::ZERO }, DeliveryReceiver { rx })
}

/// Publishing half of the in-process queue
#[derive(Debug, Clone)]
pub struct ChannelQueue {
    tx: mpsc::Sender<QueueMessage>,
    publish_timeout: Duration,
}

impl ChannelQueue {
    /// Wait up to `timeout` per entry for room in a full queue instead of
    /// failing the entry at once
    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = timeout;
        self
    }

    async fn enqueue(&self, message: QueueMessage) -> Result<(), &'static str> {
        if self.publish_timeout.is_zero() {
            return self.tx.try_send(message).map_err(|e| match e {
                TrySendError::Full(_) => "queue is full",
                TrySendError::Closed(_) => "queue is closed",
            });
        }

        self.tx.send_timeout(message, self.publish_timeout).await.map_err(|e| match e {
            SendTimeoutError::Timeout(_) => "queue is full",
            SendTimeoutError::Closed(_) => "queue is closed",
        })
    }
}

#[async_trait]
impl WorkQueue for ChannelQueue {
    async fn send_batch(&self, entries: Vec<QueueEntry>) -> Result<Vec<FailedEntry>, QueueError> {
        check_batch(&entries)?;

        if self.tx.is_closed() {
            return Err(QueueError::Closed);
        }

        let mut failed = Vec::new();
        for entry in entries {
            if let Err(reason) = self.enqueue(QueueMessage::new(entry.body)).await {
                failed.push(FailedEntry { id: entry.id, reason: reason.to_string() });
            }
        }

        Ok(failed)
    }
}

/// Consuming half of the in-process queue
#[derive(Debug)]
pub struct DeliveryReceiver {
    rx: mpsc::Receiver<QueueMessage>,
}

impl DeliveryReceiver {
    /// Wait for the next delivery of up to `max_messages` ready messages.
    ///
    /// Returns `None` once every publisher is gone and the queue is drained.
    pub async fn next_delivery(&mut self, max_messages: usize) -> Option<Delivery> {
        let first = self.rx.recv().await?;
        Some(self.fill(first, max_messages))
    }

    /// Take a delivery without waiting, `None` if nothing is ready
    pub fn try_next_delivery(&mut self, max_messages: usize) -> Option<Delivery> {
        let first = self.rx.try_recv().ok()?;
        Some(self.fill(first, max_messages))
    }

    fn fill(&mut self, first: QueueMessage, max_messages: usize) -> Delivery {
        let mut messages = vec![first];
        while messages.len() < max_messages.max(1) {
            match self.rx.try_recv() {
                Ok(message) => messages.push(message),
                Err(_) => break,
            }
        }
        Delivery { messages }
    }
}
