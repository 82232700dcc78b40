//! Shared fixtures for the integration tests

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tempfile::TempDir;
use webpulse::error::{QueueError, RegistryError};
use webpulse::models::{Liveness, MonitoredSite};
use webpulse::monitoring::Checker;
use webpulse::queue::{ChannelQueue, FailedEntry, QueueEntry, WorkQueue};
use webpulse::registry::{LibsqlRegistry, MemoryRegistry, Registry};

/// Current time at the millisecond precision the libsql registry stores
pub fn now_ms() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(Utc::now().timestamp_millis()).unwrap()
}

/// Fresh libsql registry in a temporary directory; keep the dir alive
pub async fn libsql_registry() -> (LibsqlRegistry, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let registry =
        LibsqlRegistry::open(dir.path().join("registry.db"), 4, std::time::Duration::from_secs(10))
            .await
            .unwrap();
    (registry, dir)
}

pub async fn memory_registry_with(urls: &[&str]) -> MemoryRegistry {
    let registry = MemoryRegistry::new();
    for url in urls {
        registry.register(url).await.unwrap();
    }
    registry
}

/// Checker answering from a script instead of the network.
///
/// Targets without a scripted status code behave like a refused connection.
#[derive(Default)]
pub struct ScriptedChecker {
    responses: Mutex<HashMap<String, u16>>,
    targets: Mutex<Vec<String>>,
}

impl ScriptedChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, target: &str, status_code: u16) {
        self.responses.lock().unwrap().insert(target.to_string(), status_code);
    }

    pub fn go_dark(&self, target: &str) {
        self.responses.lock().unwrap().remove(target);
    }

    /// Every target probed so far, in order
    pub fn targets(&self) -> Vec<String> {
        self.targets.lock().unwrap().clone()
    }
}

#[async_trait]
impl Checker for ScriptedChecker {
    async fn check(&self, target: &str) -> anyhow::Result<(u64, u16)> {
        self.targets.lock().unwrap().push(target.to_string());

        match self.responses.lock().unwrap().get(target) {
            Some(code) => Ok((1, *code)),
            None => Err(anyhow::anyhow!("connection refused")),
        }
    }
}

/// Queue that rejects selected publish calls and forwards the rest
pub struct FailingQueue {
    inner: ChannelQueue,
    failing_calls: HashSet<usize>,
    calls: AtomicUsize,
}

impl FailingQueue {
    pub fn new(inner: ChannelQueue, failing_calls: impl IntoIterator<Item = usize>) -> Self {
        Self { inner, failing_calls: failing_calls.into_iter().collect(), calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl WorkQueue for FailingQueue {
    async fn send_batch(&self, entries: Vec<QueueEntry>) -> Result<Vec<FailedEntry>, QueueError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_calls.contains(&call) {
            return Err(QueueError::Closed);
        }
        self.inner.send_batch(entries).await
    }
}

/// Registry whose scan fails on demand and whose status writes fail for chosen URLs
#[derive(Default)]
pub struct FlakyRegistry {
    inner: MemoryRegistry,
    scan_failing: AtomicBool,
    scans: AtomicUsize,
    failing_writes: HashSet<String>,
}

impl FlakyRegistry {
    /// Every scan fails until [`FlakyRegistry::recover_scan`] is called
    pub fn failing_scan() -> Self {
        Self { scan_failing: AtomicBool::new(true), ..Default::default() }
    }

    pub fn failing_writes<'a>(urls: impl IntoIterator<Item = &'a str>) -> Self {
        Self { failing_writes: urls.into_iter().map(String::from).collect(), ..Default::default() }
    }

    pub fn recover_scan(&self) {
        self.scan_failing.store(false, Ordering::SeqCst);
    }

    /// Scans attempted so far, failed ones included
    pub fn scans(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Registry for FlakyRegistry {
    async fn insert_if_absent(&self, site: MonitoredSite) -> Result<(), RegistryError> {
        self.inner.insert_if_absent(site).await
    }

    async fn delete_if_present(&self, url: &str) -> Result<(), RegistryError> {
        self.inner.delete_if_present(url).await
    }

    async fn list_all(&self) -> Result<Vec<MonitoredSite>, RegistryError> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        if self.scan_failing.load(Ordering::SeqCst) {
            return Err(RegistryError::Pool("store unreachable".to_string()));
        }
        self.inner.list_all().await
    }

    async fn record_status(
        &self,
        url: &str,
        liveness: Liveness,
        checked_at: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        if self.failing_writes.contains(url) {
            return Err(RegistryError::Timeout(std::time::Duration::from_secs(10)));
        }
        self.inner.record_status(url, liveness, checked_at).await
    }
}
