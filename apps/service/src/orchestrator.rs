/// Orchestrator - wires the registry, queue, batcher and probers together
///
/// The service runs two halves of the pipeline in one process:
/// - A scheduler that fans the registry out to the queue on a fixed cadence
/// - A pool of workers that probe every delivered URL and record its status
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::{error, info};
use webpulse::Config;
use webpulse::monitoring::{
    BatchReport, Batcher, Checker, HttpChecker, Prober, Scheduler, WorkerPool,
};
use webpulse::queue::{DeliveryReceiver, channel};
use webpulse::registry::{LibsqlRegistry, Registry};

pub struct Orchestrator {
    config: Arc<Config>,
    batcher: Arc<Batcher>,
    prober: Arc<Prober>,
    receiver: DeliveryReceiver,
}

impl Orchestrator {
    /// Create and run until Ctrl-C or SIGTERM
    pub async fn start(config: Config) -> Result<()> {
        Self::new(config).await?.run().await
    }

    pub async fn new(config: Config) -> Result<Self> {
        info!(path = %config.store.database_path, "Opening website registry...");
        let registry: Arc<dyn Registry> = Arc::new(
            LibsqlRegistry::open(
                &config.store.database_path,
                config.store.pool_size,
                config.store_timeout(),
            )
            .await?,
        );
        let checker = Arc::new(HttpChecker::new(config.probe_timeout())?);

        Ok(Self::from_parts(config, registry, checker))
    }

    /// Wire the pipeline around an already opened registry and checker
    pub fn from_parts(
        config: Config,
        registry: Arc<dyn Registry>,
        checker: Arc<dyn Checker>,
    ) -> Self {
        let config = Arc::new(config);

        let (queue, receiver) = channel(config.worker.queue_capacity);
        let queue = queue.with_publish_timeout(config.publish_timeout());
        let batcher =
            Arc::new(Batcher::new(registry.clone(), Arc::new(queue), config.scheduler.batch_size));
        let prober = Arc::new(Prober::new(registry, checker));

        Self { config, batcher, prober, receiver }
    }

    async fn run(self) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let scheduler = Scheduler::new(self.batcher, self.config.schedule_interval())
            .spawn(shutdown_rx.clone());
        let workers = WorkerPool::new(
            self.prober,
            self.receiver,
            self.config.worker.workers,
            self.config.worker.max_messages_per_delivery,
        )
        .spawn(shutdown_rx);

        info!(workers = self.config.worker.workers, "Webpulse service running");
        let signal = shutdown_signal().await;

        shutdown_tx.send_replace(true);
        for handle in std::iter::once(scheduler).chain(workers) {
            if let Err(e) = handle.await {
                error!("Task failed during shutdown: {}", e);
            }
        }

        info!("Webpulse service stopped");
        signal
    }

    /// One batcher invocation, probing deliveries while the batcher is still publishing
    pub async fn run_cycle(mut self) -> Result<BatchReport> {
        let max_messages = self.config.worker.max_messages_per_delivery;
        let (mut recorded, mut skipped) = (0, 0);

        let batcher = self.batcher.clone();
        let mut publish = tokio::spawn(async move { batcher.run().await });

        let report = loop {
            tokio::select! {
                res = &mut publish => break res??,
                Some(delivery) = self.receiver.next_delivery(max_messages) => {
                    let outcome = self.prober.handle_delivery(delivery).await;
                    recorded += outcome.recorded();
                    skipped += outcome.skipped();
                }
            }
        };

        while let Some(delivery) = self.receiver.try_next_delivery(max_messages) {
            let outcome = self.prober.handle_delivery(delivery).await;
            recorded += outcome.recorded();
            skipped += outcome.skipped();
        }

        info!(recorded, skipped, "Probed every enqueued website");
        Ok(report)
    }
}

async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                res?;
                info!("Received Ctrl+C, shutting down...");
            }
            _ = terminate.recv() => {
                info!("Received SIGTERM, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C, shutting down...");
    }

    Ok(())
}
