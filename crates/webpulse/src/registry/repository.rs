use std::future::Future;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool::managed::{Object, Pool};
use libsql::{Row, params};

use super::{Registry, migrations};
use crate::error::RegistryError;
use crate::models::{LastChecked, Liveness, MonitoredSite, SiteStatus};
use crate::pool::{LibsqlManager, LibsqlPool};

/// LibSQL-backed registry shared by the service and the registration server
pub struct LibsqlRegistry {
    pool: LibsqlPool,
    op_timeout: Duration,
}

impl LibsqlRegistry {
    /// Open (or create) a local database file and bring its schema up to date
    pub async fn open(
        path: impl AsRef<Path>,
        pool_size: usize,
        op_timeout: Duration,
    ) -> Result<Self, RegistryError> {
        let database = libsql::Builder::new_local(path.as_ref()).build().await?;
        let pool = Pool::builder(LibsqlManager::new(database))
            .max_size(pool_size.max(1))
            .build()
            .map_err(|e| RegistryError::Pool(e.to_string()))?;

        let registry = Self::new_from_pool(pool, op_timeout);
        let conn = registry.get_conn().await?;
        registry.bounded(migrations::run_migrations(&conn)).await?;

        Ok(registry)
    }

    /// Create a registry from an existing pool whose schema is already migrated
    pub fn new_from_pool(pool: LibsqlPool, op_timeout: Duration) -> Self {
        Self { pool, op_timeout }
    }

    /// Look up a single site
    pub async fn get(&self, url: &str) -> Result<Option<MonitoredSite>, RegistryError> {
        self.bounded(self.select_site(url)).await
    }

    async fn get_conn(&self) -> Result<Object<LibsqlManager>, RegistryError> {
        self.pool.get().await.map_err(|e| RegistryError::Pool(e.to_string()))
    }

    /// Every store round trip is bounded so a stuck store cannot stall a worker
    async fn bounded<T, F>(&self, op: F) -> Result<T, RegistryError>
    where
        F: Future<Output = Result<T, RegistryError>>,
    {
        tokio::time::timeout(self.op_timeout, op)
            .await
            .map_err(|_| RegistryError::Timeout(self.op_timeout))?
    }

    async fn select_site(&self, url: &str) -> Result<Option<MonitoredSite>, RegistryError> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query("SELECT url, status, last_checked FROM websites WHERE url = ?1", params![url])
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(site_from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Returns whether a row was inserted
    async fn insert_row(&self, site: &MonitoredSite) -> Result<bool, RegistryError> {
        let conn = self.get_conn().await?;
        let affected = conn
            .execute(
                "INSERT INTO websites (url, status, last_checked, created_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(url) DO NOTHING",
                params![
                    site.url.clone(),
                    site.status.as_str(),
                    site.last_checked.as_millis(),
                    Utc::now().timestamp_millis()
                ],
            )
            .await?;
        Ok(affected > 0)
    }

    /// Returns whether a row was deleted
    async fn delete_row(&self, url: &str) -> Result<bool, RegistryError> {
        let conn = self.get_conn().await?;
        let affected = conn.execute("DELETE FROM websites WHERE url = ?1", params![url]).await?;
        Ok(affected > 0)
    }

    async fn scan_rows(&self) -> Result<Vec<MonitoredSite>, RegistryError> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query("SELECT url, status, last_checked FROM websites ORDER BY created_at, url", ())
            .await?;

        let mut sites = Vec::new();
        while let Some(row) = rows.next().await? {
            sites.push(site_from_row(&row)?);
        }

        tracing::debug!("Fetched {} websites from the registry", sites.len());
        Ok(sites)
    }

    async fn upsert_status(
        &self,
        url: &str,
        liveness: Liveness,
        checked_at: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        let conn = self.get_conn().await?;
        conn.execute(
            "INSERT INTO websites (url, status, last_checked, created_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(url) DO UPDATE SET status = excluded.status, last_checked = excluded.last_checked
             WHERE websites.last_checked IS NULL OR websites.last_checked <= excluded.last_checked",
            params![
                url,
                SiteStatus::from(liveness).as_str(),
                checked_at.timestamp_millis(),
                Utc::now().timestamp_millis()
            ],
        )
        .await?;
        Ok(())
    }
}

fn site_from_row(row: &Row) -> Result<MonitoredSite, RegistryError> {
    let status: String = row.get(1)?;
    let last_checked: Option<i64> = row.get(2)?;

    Ok(MonitoredSite {
        url: row.get(0)?,
        status: status
            .parse::<SiteStatus>()
            .map_err(|e| RegistryError::Malformed(e.to_string()))?,
        last_checked: LastChecked::from_millis(last_checked)
            .map_err(|e| RegistryError::Malformed(e.to_string()))?,
    })
}

#[async_trait]
impl Registry for LibsqlRegistry {
    async fn insert_if_absent(&self, site: MonitoredSite) -> Result<(), RegistryError> {
        if self.bounded(self.insert_row(&site)).await? {
            Ok(())
        } else {
            Err(RegistryError::AlreadyExists(site.url))
        }
    }

    async fn delete_if_present(&self, url: &str) -> Result<(), RegistryError> {
        if self.bounded(self.delete_row(url)).await? {
            Ok(())
        } else {
            Err(RegistryError::NotFound(url.to_string()))
        }
    }

    async fn list_all(&self) -> Result<Vec<MonitoredSite>, RegistryError> {
        self.bounded(self.scan_rows()).await
    }

    async fn record_status(
        &self,
        url: &str,
        liveness: Liveness,
        checked_at: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        self.bounded(self.upsert_status(url, liveness, checked_at)).await
    }
}
