//! Repository implementations backed by sqlx.

pub mod account;

pub use account::{AccountRepository, SqlxAccountRepository};
