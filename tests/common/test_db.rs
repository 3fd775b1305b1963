//! File-backed SQLite databases for integration tests.
//!
//! Databases live under `data/test/` with unique names so parallel tests never
//! share a file, and are removed on drop.

#![allow(clippy::duplicate_mod)]

use servicehub::config::DatabaseConfig;
use servicehub::storage::{create_pool, DbPool};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Counter for generating unique database names within a test run
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

fn test_db_dir() -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(manifest_dir).join("data").join("test")
}

fn unique_db_name(prefix: &str) -> String {
    let counter = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    let uuid_short = &Uuid::new_v4().to_string()[..8];
    format!("{}_{}_{}_{}.db", prefix, std::process::id(), counter, uuid_short)
}

/// A migrated test database that deletes its file on drop.
pub struct TestDatabase {
    pub pool: DbPool,
    pub path: PathBuf,
}

impl TestDatabase {
    pub async fn new(prefix: &str) -> Self {
        Self::with_migrations(prefix, true).await
    }

    pub async fn with_migrations(prefix: &str, auto_migrate: bool) -> Self {
        let db_dir = test_db_dir();
        std::fs::create_dir_all(&db_dir).expect("create test database directory");

        let path = db_dir.join(unique_db_name(prefix));
        let config = DatabaseConfig {
            url: format!("sqlite://{}", path.display()),
            max_connections: 5,
            auto_migrate,
            ..Default::default()
        };
        let pool = create_pool(&config).await.expect("create test database pool");

        Self { pool, path }
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        // Best effort cleanup - don't panic in drop
        if let Err(e) = std::fs::remove_file(&self.path) {
            eprintln!("Warning: Failed to cleanup test database {:?}: {}", self.path, e);
        }
        let _ = std::fs::remove_file(self.path.with_extension("db-wal"));
        let _ = std::fs::remove_file(self.path.with_extension("db-shm"));
    }
}
