/// Registry of monitored websites
///
/// The registry is the only shared mutable state in the pipeline. Registration
/// and removal are conditional writes that enforce uniqueness and existence;
/// status writes are idempotent overwrites, so no external locking is needed.
pub mod memory;
pub mod migrations;
pub mod repository;

pub use memory::MemoryRegistry;
pub use repository::LibsqlRegistry;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{RegistryError, ValidationError};
use crate::models::{Liveness, MonitoredSite};
use crate::validation::validate_url;

/// Store contract consumed by the batcher, the prober and the registration surface
#[async_trait]
pub trait Registry: Send + Sync {
    /// Insert the site only if its URL is absent; `AlreadyExists` otherwise
    async fn insert_if_absent(&self, site: MonitoredSite) -> Result<(), RegistryError>;

    /// Delete the site only if its URL is present; `NotFound` otherwise
    async fn delete_if_present(&self, url: &str) -> Result<(), RegistryError>;

    /// Snapshot of every registered site. Not consistent across concurrent writes.
    async fn list_all(&self) -> Result<Vec<MonitoredSite>, RegistryError>;

    /// Upsert the status observed at `checked_at`.
    ///
    /// A URL removed concurrently is recreated. Observations older than the
    /// stored `last_checked` are ignored.
    async fn record_status(
        &self,
        url: &str,
        liveness: Liveness,
        checked_at: DateTime<Utc>,
    ) -> Result<(), RegistryError>;

    /// Validate and register a new URL with status `UNKNOWN`, never checked
    async fn register(&self, url: &str) -> Result<MonitoredSite, RegistryError> {
        validate_url(url)?;

        let site = MonitoredSite::new(url);
        self.insert_if_absent(site.clone()).await?;
        Ok(site)
    }

    /// Remove a registered URL
    async fn remove(&self, url: &str) -> Result<(), RegistryError> {
        if url.is_empty() {
            return Err(ValidationError::Missing.into());
        }
        self.delete_if_present(url).await
    }
}
