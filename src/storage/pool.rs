//! # Database Connection Pool Management
//!
//! Provides SQLite connection pool creation for the account store.

use std::{str::FromStr, time::Duration};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Pool, Sqlite,
};

use crate::config::DatabaseConfig;
use crate::errors::{Result, ServiceHubError};

/// Type alias for the database connection pool
pub type DbPool = Pool<Sqlite>;

const SQLITE_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Create a database connection pool with the specified configuration
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool> {
    validate_config(config)?;

    let connect_options = SqliteConnectOptions::from_str(&config.url)
        .map_err(|e| {
            ServiceHubError::database(
                e,
                format!("Invalid SQLite connection string: {}", sanitize_url(&config.url)),
            )
        })?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(SQLITE_BUSY_TIMEOUT);

    // An in-memory database disappears with its last connection, so keep
    // exactly one alive for the lifetime of the pool.
    let (pool_options, connect_options) = if config.is_in_memory() {
        let options = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
        (options, connect_options)
    } else {
        let options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .idle_timeout(config.idle_timeout());
        (options, connect_options.journal_mode(SqliteJournalMode::Wal))
    };

    let pool = pool_options
        .acquire_timeout(config.connect_timeout())
        .test_before_acquire(true)
        .connect_with(connect_options)
        .await
        .map_err(|e| {
            tracing::error!(
                error = %e,
                url = %sanitize_url(&config.url),
                busy_timeout_ms = SQLITE_BUSY_TIMEOUT.as_millis(),
                "Failed to create SQLite database pool"
            );
            ServiceHubError::database(
                e,
                format!("Failed to connect to database: {}", sanitize_url(&config.url)),
            )
        })?;

    tracing::info!(
        in_memory = config.is_in_memory(),
        max_connections = config.max_connections,
        connect_timeout_ms = config.connect_timeout().as_millis(),
        idle_timeout_ms = config.idle_timeout().map(|d| d.as_millis()),
        "Database connection pool created"
    );

    if config.auto_migrate {
        tracing::info!("Auto-migration enabled, running database migrations");
        crate::storage::migrations::run_migrations(&pool).await?;
    }

    Ok(pool)
}

/// Validate database configuration
fn validate_config(config: &DatabaseConfig) -> Result<()> {
    if config.max_connections == 0 {
        return Err(ServiceHubError::validation("max_connections must be greater than 0"));
    }

    if config.min_connections > config.max_connections {
        return Err(ServiceHubError::validation(
            "min_connections cannot be greater than max_connections",
        ));
    }

    if !config.url.starts_with("sqlite:") {
        return Err(ServiceHubError::validation("database URL must start with 'sqlite:'"));
    }

    Ok(())
}

/// Sanitize database URL for logging (strip query parameters)
fn sanitize_url(url: &str) -> String {
    match url.split_once('?') {
        Some((base, _)) => format!("{base}?***"),
        None => url.to_string(),
    }
}

/// Check database connectivity
pub async fn check_connection(pool: &DbPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .map_err(|e| ServiceHubError::database(e, "Database connectivity check failed"))?;
    Ok(())
}
