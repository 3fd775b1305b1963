//! # Storage and Persistence
//!
//! SQLite connectivity, embedded migrations and the account repository.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use crate::config::DatabaseConfig;

pub use migrations::{
    get_migration_version, list_applied_migrations, migration_status, run_migrations,
    MigrationInfo, MigrationStatus,
};
pub use pool::{check_connection, create_pool, DbPool};
pub use repositories::{AccountRepository, SqlxAccountRepository};
