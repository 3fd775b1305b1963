//! Business logic services.

pub mod account_service;

pub use account_service::{AccountService, RegisteredAccount, PROFILE_ACTIVITY_LIMIT};
