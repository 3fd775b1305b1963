//! Account repository
//!
//! Persistence for accounts and their activity log. Lookups return `Ok(None)`
//! for absent or soft-deleted accounts so callers can tell "not found" apart
//! from a failing store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::str::FromStr;
use tracing::instrument;

use crate::domain::{Account, AccountActivity, AccountId, ActivityKind, NewAccount};
use crate::errors::{Result, ServiceHubError};
use crate::storage::DbPool;

#[derive(Debug, Clone, FromRow)]
struct AccountRow {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: AccountId::new(row.id),
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct ActivityRow {
    pub id: i64,
    pub account_id: i64,
    pub activity: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ActivityRow> for AccountActivity {
    type Error = ServiceHubError;

    fn try_from(row: ActivityRow) -> Result<Self> {
        let activity = ActivityKind::from_str(&row.activity)
            .map_err(|e| ServiceHubError::internal(e.to_string()))?;
        Ok(AccountActivity {
            id: row.id,
            account_id: AccountId::new(row.account_id),
            activity,
            created_at: row.created_at,
        })
    }
}

const ACCOUNT_COLUMNS: &str = "id, email, password_hash, created_at, updated_at, deleted_at";

/// Storage of accounts and their activity log.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Create an account. Fails with `Conflict` when the email is already taken.
    async fn create_account(&self, account: NewAccount) -> Result<Account>;

    /// Get a live account by ID
    async fn get_account(&self, id: AccountId) -> Result<Option<Account>>;

    /// Get a live account by email
    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Replace an account's password hash
    async fn update_password(&self, id: AccountId, password_hash: &str) -> Result<()>;

    /// Change an account's email. Fails with `Conflict` when the email is taken.
    async fn update_email(&self, id: AccountId, email: &str) -> Result<Account>;

    /// Soft-delete an account
    async fn delete_account(&self, id: AccountId) -> Result<()>;

    /// Append an activity entry
    async fn record_activity(
        &self,
        account_id: AccountId,
        activity: ActivityKind,
    ) -> Result<AccountActivity>;

    /// Most recent activity entries for an account, newest first
    async fn list_activities(&self, account_id: AccountId, limit: i64)
        -> Result<Vec<AccountActivity>>;
}

#[derive(Debug, Clone)]
pub struct SqlxAccountRepository {
    pool: DbPool,
}

impl SqlxAccountRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_write_error(err: sqlx::Error, context: &str) -> ServiceHubError {
    let is_unique = err.as_database_error().is_some_and(|db_err| db_err.is_unique_violation());
    if is_unique {
        return ServiceHubError::conflict("email is already registered", "account");
    }
    ServiceHubError::database(err, context)
}

#[async_trait]
impl AccountRepository for SqlxAccountRepository {
    #[instrument(skip(self, account), fields(account_email = %account.email), name = "db_create_account")]
    async fn create_account(&self, account: NewAccount) -> Result<Account> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO accounts (email, password_hash, created_at, updated_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_error(err, "Failed to create account"))?;

        let id = AccountId::new(result.last_insert_rowid());
        self.get_account(id)
            .await?
            .ok_or_else(|| ServiceHubError::internal("Account not found after creation"))
    }

    #[instrument(skip(self), fields(account_id = %id), name = "db_get_account")]
    async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| ServiceHubError::database(err, "Failed to fetch account"))?;

        Ok(row.map(Account::from))
    }

    #[instrument(skip(self), fields(account_email = %email), name = "db_get_account_by_email")]
    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1 AND deleted_at IS NULL"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| ServiceHubError::database(err, "Failed to fetch account by email"))?;

        Ok(row.map(Account::from))
    }

    #[instrument(skip(self, password_hash), fields(account_id = %id), name = "db_update_account_password")]
    async fn update_password(&self, id: AccountId, password_hash: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE accounts SET password_hash = $1, updated_at = $2 WHERE id = $3 AND deleted_at IS NULL",
        )
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| ServiceHubError::database(err, "Failed to update account password"))?;

        if result.rows_affected() == 0 {
            return Err(ServiceHubError::not_found("Account", id.to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(account_id = %id, account_email = %email), name = "db_update_account_email")]
    async fn update_email(&self, id: AccountId, email: &str) -> Result<Account> {
        let result = sqlx::query(
            "UPDATE accounts SET email = $1, updated_at = $2 WHERE id = $3 AND deleted_at IS NULL",
        )
        .bind(email)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_error(err, "Failed to update account email"))?;

        if result.rows_affected() == 0 {
            return Err(ServiceHubError::not_found("Account", id.to_string()));
        }

        self.get_account(id)
            .await?
            .ok_or_else(|| ServiceHubError::not_found("Account", id.to_string()))
    }

    #[instrument(skip(self), fields(account_id = %id), name = "db_delete_account")]
    async fn delete_account(&self, id: AccountId) -> Result<()> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE accounts SET deleted_at = $1, updated_at = $2 WHERE id = $3 AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|err| ServiceHubError::database(err, "Failed to delete account"))?;

        if result.rows_affected() == 0 {
            return Err(ServiceHubError::not_found("Account", id.to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(account_id = %account_id, activity = %activity), name = "db_record_account_activity")]
    async fn record_activity(
        &self,
        account_id: AccountId,
        activity: ActivityKind,
    ) -> Result<AccountActivity> {
        let created_at = Utc::now();

        let result = sqlx::query(
            "INSERT INTO account_activities (account_id, activity, created_at) VALUES ($1, $2, $3)",
        )
        .bind(account_id)
        .bind(activity.as_str())
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|err| ServiceHubError::database(err, "Failed to record account activity"))?;

        Ok(AccountActivity { id: result.last_insert_rowid(), account_id, activity, created_at })
    }

    #[instrument(skip(self), fields(account_id = %account_id), name = "db_list_account_activities")]
    async fn list_activities(
        &self,
        account_id: AccountId,
        limit: i64,
    ) -> Result<Vec<AccountActivity>> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            "SELECT id, account_id, activity, created_at FROM account_activities \
             WHERE account_id = $1 ORDER BY id DESC LIMIT $2",
        )
        .bind(account_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| ServiceHubError::database(err, "Failed to list account activities"))?;

        rows.into_iter().map(AccountActivity::try_from).collect()
    }
}
