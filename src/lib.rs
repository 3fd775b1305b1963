//! # ServiceHub
//!
//! Account management API: registration, login, logout, profile and password
//! reset over a SQLite account store.
//!
//! ## Architecture
//!
//! ```text
//! REST API (axum) → AccountService → AccountRepository (sqlx/SQLite)
//!      ↓                 ↓      ↘
//! Auth middleware   Argon2 / JWT   MailSender (log or HTTP relay)
//! ```
//!
//! The account workflow depends only on traits ([`storage::AccountRepository`],
//! [`auth::CredentialHasher`], [`auth::TokenService`], [`mail::MailSender`]), so
//! each collaborator can be replaced in tests.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod mail;
pub mod observability;
pub mod services;
pub mod startup;
pub mod storage;

pub use config::AppConfig;
pub use errors::{Error, Result, ServiceHubError};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
