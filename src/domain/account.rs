//! Account domain models.
//!
//! This module defines the account record, the append-only activity log entry
//! and the public profile projection handed back to clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;

use super::AccountId;

/// Kind of account-affecting action recorded in the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Register,
    Login,
    Logout,
    ResetPassword,
    ForgotPassword,
    Update,
    Delete,
    ChangePassword,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 8] = [
        ActivityKind::Register,
        ActivityKind::Login,
        ActivityKind::Logout,
        ActivityKind::ResetPassword,
        ActivityKind::ForgotPassword,
        ActivityKind::Update,
        ActivityKind::Delete,
        ActivityKind::ChangePassword,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Register => "register",
            ActivityKind::Login => "login",
            ActivityKind::Logout => "logout",
            ActivityKind::ResetPassword => "reset_password",
            ActivityKind::ForgotPassword => "forgot_password",
            ActivityKind::Update => "update",
            ActivityKind::Delete => "delete",
            ActivityKind::ChangePassword => "change_password",
        }
    }
}

impl Display for ActivityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = ActivityKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ActivityKindParseError(s.to_string()))
    }
}

/// Error returned when an activity tag read from storage is unknown.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid account activity: {0}")]
pub struct ActivityKindParseError(pub String);

/// Stored representation of an account.
///
/// `password_hash` always holds a self-describing argon2 hash, never raw input.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Account {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// New account creation payload. The password must already be hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: String,
}

/// Append-only audit entry for an account action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccountActivity {
    pub id: i64,
    pub account_id: AccountId,
    pub activity: ActivityKind,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}

/// Public account fields returned to the account owner.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountProfile {
    pub id: AccountId,
    pub email: String,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTime<Utc>,
    pub activities: Vec<AccountActivity>,
}

impl AccountProfile {
    pub fn from_account(account: &Account, activities: Vec<AccountActivity>) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            created_at: account.created_at,
            updated_at: account.updated_at,
            activities,
        }
    }
}
