//! Domain layer
//!
//! Pure account entities with no HTTP or database framework dependencies
//! beyond the derives needed to move them across those boundaries.
//!
//! ## Module Organization
//!
//! - `id`: Type-safe numeric account identifier
//! - `account`: Account records, activity log entries and the public profile

pub mod account;
pub mod id;

pub use account::{
    Account, AccountActivity, AccountProfile, ActivityKind, ActivityKindParseError, NewAccount,
};
pub use id::AccountId;
