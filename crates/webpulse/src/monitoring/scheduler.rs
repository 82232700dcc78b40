use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use super::batcher::Batcher;
use super::types::BatchReport;

/// Invokes the batcher on a fixed cadence.
///
/// Each tick starts an independent invocation, so a slow run may overlap the
/// next one. Failures are logged and never stop the driver.
pub struct Scheduler {
    batcher: Arc<Batcher>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(batcher: Arc<Batcher>, interval: Duration) -> Self {
        Self { batcher, interval }
    }

    /// Run until `shutdown` flips to `true` or its sender is dropped
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut timer = interval(self.interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::info!(interval = ?self.interval, "Scheduler started");

            loop {
                if *shutdown.borrow() {
                    break;
                }

                tokio::select! {
                    _ = timer.tick() => {
                        let batcher = self.batcher.clone();
                        tokio::spawn(async move {
                            run_invocation(&batcher).await;
                        });
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }

            tracing::info!("Scheduler stopped");
        })
    }
}

/// One no-argument batcher invocation, with its failure logged
pub async fn run_invocation(batcher: &Batcher) -> Option<BatchReport> {
    match batcher.run().await {
        Ok(report) => Some(report),
        Err(e) => {
            tracing::error!("Batcher invocation failed: {}", e);
            None
        }
    }
}
