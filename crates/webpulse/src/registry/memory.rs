use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::Registry;
use crate::error::RegistryError;
use crate::models::{Liveness, MonitoredSite};

/// In-process registry, scanned in key order
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    sites: RwLock<BTreeMap<String, MonitoredSite>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a single site
    pub async fn get(&self, url: &str) -> Option<MonitoredSite> {
        self.sites.read().await.get(url).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sites.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sites.read().await.is_empty()
    }
}

#[async_trait]
impl Registry for MemoryRegistry {
    async fn insert_if_absent(&self, site: MonitoredSite) -> Result<(), RegistryError> {
        match self.sites.write().await.entry(site.url.clone()) {
            Entry::Occupied(_) => Err(RegistryError::AlreadyExists(site.url)),
            Entry::Vacant(slot) => {
                slot.insert(site);
                Ok(())
            }
        }
    }

    async fn delete_if_present(&self, url: &str) -> Result<(), RegistryError> {
        self.sites
            .write()
            .await
            .remove(url)
            .map(|_| ())
            .ok_or_else(|| RegistryError::NotFound(url.to_string()))
    }

    async fn list_all(&self) -> Result<Vec<MonitoredSite>, RegistryError> {
        Ok(self.sites.read().await.values().cloned().collect())
    }

    async fn record_status(
        &self,
        url: &str,
        liveness: Liveness,
        checked_at: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        self.sites
            .write()
            .await
            .entry(url.to_string())
            .or_insert_with(|| MonitoredSite::new(url))
            .observe(liveness, checked_at);
        Ok(())
    }
}
