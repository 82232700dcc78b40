use chrono::Utc;
use libsql::Connection;

use crate::error::RegistryError;

/// Schema version - increment when making schema changes
const SCHEMA_VERSION: i32 = 1;

/// Run database migrations
///
/// Both the service and the registration server call this on startup; every
/// statement is idempotent so concurrent first runs are harmless.
pub async fn run_migrations(conn: &Connection) -> Result<(), RegistryError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL,
            description TEXT
        )",
        (),
    )
    .await?;

    let current_version = get_current_version(conn).await?;

    if current_version >= SCHEMA_VERSION {
        tracing::debug!("Registry schema is up to date (version {})", current_version);
        return Ok(());
    }

    tracing::info!("Running migrations from version {} to {}", current_version, SCHEMA_VERSION);

    if current_version < 1 {
        run_migration_v1(conn).await?;
        record_migration(conn, 1, "Create websites registry").await?;
    }

    Ok(())
}

async fn get_current_version(conn: &Connection) -> Result<i32, RegistryError> {
    let mut rows = conn.query("SELECT MAX(version) FROM schema_migrations", ()).await?;

    if let Some(row) = rows.next().await? {
        let version: Option<i32> = row.get(0)?;
        Ok(version.unwrap_or(0))
    } else {
        Ok(0)
    }
}

async fn record_migration(
    conn: &Connection,
    version: i32,
    description: &str,
) -> Result<(), RegistryError> {
    conn.execute(
        "INSERT OR IGNORE INTO schema_migrations (version, applied_at, description) VALUES (?, ?, ?)",
        libsql::params![version, Utc::now().timestamp(), description],
    )
    .await?;

    tracing::info!("Applied migration v{}: {}", version, description);
    Ok(())
}

/// Migration v1: one row per registered URL.
/// `last_checked` holds epoch milliseconds, NULL until the first probe.
async fn run_migration_v1(conn: &Connection) -> Result<(), RegistryError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS websites (
            url TEXT PRIMARY KEY NOT NULL,
            status TEXT NOT NULL DEFAULT 'UNKNOWN',
            last_checked INTEGER,
            created_at INTEGER NOT NULL
        )",
        (),
    )
    .await?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_websites_created_at ON websites(created_at)",
        (),
    )
    .await?;

    Ok(())
}
