//! webpulse - reachability monitoring for a registry of websites
//!
//! A periodic scheduler snapshots the registry and fans every registered URL out
//! to a work queue in bounded batches; a pool of workers probes each URL and
//! records the last-known status back into the registry.

pub mod config;
pub mod error;
pub mod models;
pub mod monitoring;
pub mod pool;
pub mod queue;
pub mod registry;
pub mod validation;

// Re-export main types
pub use config::{Config, ConfigError};
pub use error::{BatchError, QueueError, RegistryError, ValidationError};
pub use models::{LastChecked, Liveness, MonitoredSite, SiteStatus};
pub use monitoring::{Batcher, HttpChecker, Prober, Scheduler, WorkerPool};
pub use queue::{ChannelQueue, DeliveryReceiver, WorkQueue};
pub use registry::{LibsqlRegistry, MemoryRegistry, Registry};
pub use validation::{canonicalize_for_probe, is_valid_url, validate_url};

/// Default number of registry entries published per queue call
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Default bound on a single liveness probe, in seconds
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;
