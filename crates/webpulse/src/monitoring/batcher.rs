use std::sync::Arc;

use tracing::{info, warn};

use super::types::{BatchReport, FailedSite};
use crate::error::BatchError;
use crate::models::MonitoredSite;
use crate::queue::{FailedEntry, MAX_BATCH_ENTRIES, QueueEntry, WorkQueue};
use crate::registry::Registry;

/// Split a registry snapshot into consecutive publish batches.
///
/// Each entry is keyed by its 0-based position within its batch and carries
/// the registered URL. The last batch may be smaller.
pub fn partition(sites: &[MonitoredSite], batch_size: usize) -> Vec<Vec<QueueEntry>> {
    sites
        .chunks(batch_size.max(1))
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .map(|(idx, site)| QueueEntry { id: idx.to_string(), body: site.url.clone() })
                .collect()
        })
        .collect()
}

/// Fans the full registry out to the work queue
pub struct Batcher {
    registry: Arc<dyn Registry>,
    queue: Arc<dyn WorkQueue>,
    batch_size: usize,
}

impl Batcher {
    /// `batch_size` is clamped to what one publish call accepts
    pub fn new(registry: Arc<dyn Registry>, queue: Arc<dyn WorkQueue>, batch_size: usize) -> Self {
        Self { registry, queue, batch_size: batch_size.clamp(1, MAX_BATCH_ENTRIES) }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Snapshot the registry and publish it batch by batch.
    ///
    /// A failed scan fails the invocation before anything is published. A failed
    /// publish only affects its own batch; there is no retry at this layer.
    pub async fn run(&self) -> Result<BatchReport, BatchError> {
        let sites = self.registry.list_all().await.map_err(BatchError::Scan)?;
        let batches = partition(&sites, self.batch_size);

        let mut report =
            BatchReport { sites: sites.len(), batches: batches.len(), ..Default::default() };

        for (batch, entries) in batches.into_iter().enumerate() {
            let urls: Vec<String> = entries.iter().map(|entry| entry.body.clone()).collect();

            let failed = match self.queue.send_batch(entries.clone()).await {
                Ok(failed) => failed,
                Err(e) => entries
                    .iter()
                    .map(|entry| FailedEntry { id: entry.id.clone(), reason: e.to_string() })
                    .collect(),
            };

            if !failed.is_empty() {
                let ids: Vec<String> = failed.iter().map(ToString::to_string).collect();
                warn!(batch, failed = ?ids, "Failed to send some messages");
            }

            let mut lost = 0;
            for entry in failed {
                match entry.id.parse::<usize>().ok().and_then(|idx| urls.get(idx)) {
                    Some(url) => {
                        lost += 1;
                        report.failed.push(FailedSite { batch, url: url.clone(), reason: entry.reason });
                    }
                    None => {
                        warn!(batch, id = %entry.id, reason = %entry.reason, "Queue reported an unknown entry id")
                    }
                }
            }
            report.published += urls.len().saturating_sub(lost);
        }

        info!(
            sites = report.sites,
            batches = report.batches,
            published = report.published,
            failed = report.failed.len(),
            "Websites have been batched and sent to the queue"
        );
        Ok(report)
    }
}
