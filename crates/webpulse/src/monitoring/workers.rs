use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::prober::Prober;
use crate::queue::DeliveryReceiver;

/// Pool of workers pulling deliveries off the queue
pub struct WorkerPool {
    prober: Arc<Prober>,
    receiver: Arc<Mutex<DeliveryReceiver>>,
    workers: usize,
    max_messages: usize,
}

impl WorkerPool {
    pub fn new(
        prober: Arc<Prober>,
        receiver: DeliveryReceiver,
        workers: usize,
        max_messages: usize,
    ) -> Self {
        Self {
            prober,
            receiver: Arc::new(Mutex::new(receiver)),
            workers: workers.max(1),
            max_messages: max_messages.max(1),
        }
    }

    /// Start every worker. Each stops on shutdown or once the queue is closed and drained.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        (0..self.workers)
            .map(|worker| {
                let prober = self.prober.clone();
                let receiver = self.receiver.clone();
                let mut shutdown = shutdown.clone();
                let max_messages = self.max_messages;

                tokio::spawn(async move {
                    debug!(worker, "Worker started");

                    loop {
                        if *shutdown.borrow() {
                            break;
                        }

                        let delivery = tokio::select! {
                            delivery = async { receiver.lock().await.next_delivery(max_messages).await } => delivery,
                            changed = shutdown.changed() => {
                                if changed.is_err() {
                                    break;
                                }
                                continue;
                            }
                        };

                        match delivery {
                            Some(delivery) => {
                                prober.handle_delivery(delivery).await;
                            }
                            None => {
                                info!(worker, "Queue closed, worker exiting");
                                break;
                            }
                        }
                    }

                    debug!(worker, "Worker stopped");
                })
            })
            .collect()
    }
}
