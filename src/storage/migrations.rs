//! # Database Migration Management
//!
//! SQL migrations under `migrations/` are embedded into the binary with
//! `sqlx::migrate!` and applied on startup when `auto_migrate` is enabled, or
//! explicitly through `servicehub database migrate`.

use serde::{Deserialize, Serialize};
use sqlx::migrate::Migrator;
use sqlx::Row;
use tracing::{error, info};

use crate::errors::{Result, ServiceHubError};
use crate::storage::DbPool;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// An applied migration as recorded by sqlx
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationInfo {
    pub version: i64,
    pub description: String,
    pub installed_on: String,
    pub execution_time: i64,
}

/// Applied and pending migrations for the connected database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationStatus {
    pub applied: Vec<MigrationInfo>,
    pub pending: Vec<i64>,
}

impl MigrationStatus {
    pub fn is_current(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Run all pending database migrations
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    info!(available = MIGRATOR.iter().count(), "Starting database migration process");

    MIGRATOR.run(pool).await.map_err(|e| {
        error!(error = %e, "Database migration failed");
        ServiceHubError::from(e)
    })?;

    info!(version = get_migration_version(pool).await?, "Database migrations completed");
    Ok(())
}

/// Get the current migration version (highest applied)
pub async fn get_migration_version(pool: &DbPool) -> Result<i64> {
    let applied = list_applied_migrations(pool).await?;
    Ok(applied.iter().map(|m| m.version).max().unwrap_or(0))
}

/// List all applied migrations
pub async fn list_applied_migrations(pool: &DbPool) -> Result<Vec<MigrationInfo>> {
    if !migration_table_exists(pool).await? {
        return Ok(Vec::new());
    }

    let rows = sqlx::query(
        "SELECT version, description, CAST(installed_on AS TEXT) AS installed_on, execution_time \
         FROM _sqlx_migrations WHERE success = 1 ORDER BY version",
    )
    .fetch_all(pool)
    .await
    .map_err(|e| ServiceHubError::database(e, "Failed to list applied migrations"))?;

    Ok(rows
        .into_iter()
        .map(|row| MigrationInfo {
            version: row.get("version"),
            description: row.get("description"),
            installed_on: row.get("installed_on"),
            execution_time: row.get("execution_time"),
        })
        .collect())
}

/// Compare the embedded migrations against what the database has applied
pub async fn migration_status(pool: &DbPool) -> Result<MigrationStatus> {
    let applied = list_applied_migrations(pool).await?;
    let pending = MIGRATOR
        .iter()
        .map(|m| m.version)
        .filter(|version| !applied.iter().any(|a| a.version == *version))
        .collect();

    Ok(MigrationStatus { applied, pending })
}

async fn migration_table_exists(pool: &DbPool) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_one(pool)
    .await
    .map_err(|e| ServiceHubError::database(e, "Failed to inspect migration table"))?;

    Ok(count > 0)
}
