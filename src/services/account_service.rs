//! Account workflow: registration, login, logout, profile and password reset.
//!
//! Every successful state-changing action attempts exactly one activity log
//! entry. Activity writes are best-effort: a failing write is logged and
//! counted but never fails or rolls back the action itself.

use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use validator::ValidateEmail;

use crate::auth::{CredentialHasher, TokenService};
use crate::domain::{Account, AccountId, AccountProfile, ActivityKind, NewAccount};
use crate::errors::{AuthErrorType, Error, Result};
use crate::mail::MailSender;
use crate::observability::metrics;
use crate::storage::AccountRepository;

/// Number of activity entries returned with a profile
pub const PROFILE_ACTIVITY_LIMIT: i64 = 20;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Result of a successful registration
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisteredAccount {
    pub id: AccountId,
    pub email: String,
    pub token: String,
}

/// Orchestrates account flows over the store, hasher, token service and mailer.
pub struct AccountService {
    accounts: Arc<dyn AccountRepository>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: Arc<dyn TokenService>,
    mailer: Arc<dyn MailSender>,
    // Verified against for unknown emails so login timing does not reveal
    // whether an account exists.
    dummy_hash: OnceLock<Option<String>>,
}

impl AccountService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: Arc<dyn TokenService>,
        mailer: Arc<dyn MailSender>,
    ) -> Self {
        Self { accounts, hasher, tokens, mailer, dummy_hash: OnceLock::new() }
    }

    /// Create an account and return its first auth token.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn register(&self, email: &str, password: &str) -> Result<RegisteredAccount> {
        let email = normalize_email(email)?;
        require_password(password)?;

        if self.accounts.get_account_by_email(&email).await?.is_some() {
            metrics::record_account_action("register", false).await;
            return Err(email_taken());
        }

        let password_hash = self.hasher.hash(password)?;
        let account = self
            .accounts
            .create_account(NewAccount { email, password_hash })
            .await
            .map_err(conflict_as_email_taken)?;

        let token = self.tokens.issue_auth_token(account.id)?;
        self.record_activity(account.id, ActivityKind::Register).await;

        metrics::record_account_action("register", true).await;
        info!(account_id = %account.id, "account registered");

        Ok(RegisteredAccount { id: account.id, email: account.email, token })
    }

    /// Exchange credentials for an auth token.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let email = normalize_email(email)?;

        let account = match self.accounts.get_account_by_email(&email).await? {
            Some(account) => account,
            None => {
                self.burn_dummy_verification(password);
                warn!("login attempt for unknown email");
                metrics::record_authentication("invalid_credentials").await;
                return Err(invalid_credentials());
            }
        };

        if !self.hasher.verify(password, &account.password_hash)? {
            warn!(account_id = %account.id, "login attempt with incorrect password");
            metrics::record_authentication("invalid_credentials").await;
            return Err(invalid_credentials());
        }

        let token = self.tokens.issue_auth_token(account.id)?;
        self.record_activity(account.id, ActivityKind::Login).await;

        metrics::record_authentication("success").await;
        info!(account_id = %account.id, "account logged in");
        Ok(token)
    }

    /// Record a logout. Tokens are stateless and remain valid until they expire.
    #[instrument(skip(self, token))]
    pub async fn logout(&self, token: &str) -> Result<()> {
        let account_id = self.tokens.verify_auth_token(token)?;
        self.record_activity(account_id, ActivityKind::Logout).await;

        metrics::record_account_action("logout", true).await;
        info!(account_id = %account_id, "account logged out");
        Ok(())
    }

    /// Public profile of the token's account, with its most recent activity.
    #[instrument(skip(self, token))]
    pub async fn profile(&self, token: &str) -> Result<AccountProfile> {
        let account = self.authenticated_account(token).await?;
        self.profile_of(&account).await
    }

    /// Send a password-reset link. Unknown emails succeed without sending mail.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        let email = normalize_email(email)?;

        let Some(account) = self.accounts.get_account_by_email(&email).await? else {
            info!("password reset requested for unknown email");
            return Ok(());
        };

        let reset_token = self.tokens.issue_password_reset_token(account.id)?;
        self.mailer.send_password_reset_email(&account.email, &reset_token).await.map_err(
            |err| {
                error!(account_id = %account.id, error = %err, "failed to send password reset email");
                Error::from(err)
            },
        )?;
        self.record_activity(account.id, ActivityKind::ForgotPassword).await;

        metrics::record_account_action("forgot_password", true).await;
        info!(account_id = %account.id, "password reset email sent");
        Ok(())
    }

    /// Set a new password using a password-reset token.
    #[instrument(skip(self, reset_token, new_password))]
    pub async fn reset_password(&self, reset_token: &str, new_password: &str) -> Result<()> {
        require_password(new_password)?;
        let account_id = self.tokens.verify_password_reset_token(reset_token)?;
        let account = self.live_account(account_id).await?;

        let password_hash = self.hasher.hash(new_password)?;
        self.accounts.update_password(account.id, &password_hash).await?;
        self.record_activity(account.id, ActivityKind::ResetPassword).await;

        metrics::record_account_action("reset_password", true).await;
        info!(account_id = %account.id, "password reset");
        Ok(())
    }

    /// Replace the password of an authenticated account after re-checking the current one.
    #[instrument(skip(self, token, current_password, new_password))]
    pub async fn change_password(
        &self,
        token: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        require_password(new_password)?;
        let account = self.authenticated_account(token).await?;

        if !self.hasher.verify(current_password, &account.password_hash)? {
            warn!(account_id = %account.id, "password change with incorrect current password");
            return Err(invalid_credentials());
        }

        let password_hash = self.hasher.hash(new_password)?;
        self.accounts.update_password(account.id, &password_hash).await?;
        self.record_activity(account.id, ActivityKind::ChangePassword).await;

        metrics::record_account_action("change_password", true).await;
        info!(account_id = %account.id, "password changed");
        Ok(())
    }

    /// Change the email address of an authenticated account.
    #[instrument(skip(self, token), fields(new_email = %new_email))]
    pub async fn update_email(&self, token: &str, new_email: &str) -> Result<AccountProfile> {
        let new_email = normalize_email(new_email)?;
        let account = self.authenticated_account(token).await?;

        if account.email == new_email {
            return self.profile_of(&account).await;
        }

        if self.accounts.get_account_by_email(&new_email).await?.is_some() {
            return Err(email_taken());
        }

        let updated = self
            .accounts
            .update_email(account.id, &new_email)
            .await
            .map_err(conflict_as_email_taken)?;
        self.record_activity(updated.id, ActivityKind::Update).await;

        metrics::record_account_action("update", true).await;
        info!(account_id = %updated.id, "account email updated");
        self.profile_of(&updated).await
    }

    /// Soft-delete an authenticated account.
    #[instrument(skip(self, token))]
    pub async fn delete_account(&self, token: &str) -> Result<()> {
        let account = self.authenticated_account(token).await?;

        self.accounts.delete_account(account.id).await?;
        self.record_activity(account.id, ActivityKind::Delete).await;

        metrics::record_account_action("delete", true).await;
        info!(account_id = %account.id, "account deleted");
        Ok(())
    }

    async fn authenticated_account(&self, token: &str) -> Result<Account> {
        let account_id = self.tokens.verify_auth_token(token)?;
        self.live_account(account_id).await
    }

    async fn live_account(&self, account_id: AccountId) -> Result<Account> {
        self.accounts
            .get_account(account_id)
            .await?
            .ok_or_else(|| Error::not_found("Account", account_id.to_string()))
    }

    async fn profile_of(&self, account: &Account) -> Result<AccountProfile> {
        let activities = self.accounts.list_activities(account.id, PROFILE_ACTIVITY_LIMIT).await?;
        Ok(AccountProfile::from_account(account, activities))
    }

    async fn record_activity(&self, account_id: AccountId, activity: ActivityKind) {
        if let Err(err) = self.accounts.record_activity(account_id, activity).await {
            error!(
                account_id = %account_id,
                activity = %activity,
                error = %err,
                "failed to record account activity"
            );
            metrics::record_activity_log_failure(activity.as_str()).await;
        }
    }

    fn burn_dummy_verification(&self, password: &str) {
        let dummy = self.dummy_hash.get_or_init(|| self.hasher.hash("dummy-credential").ok());
        if let Some(hash) = dummy {
            if let Err(e) = self.hasher.verify(password, hash) {
                warn!(error = %e, "dummy hash verification failed unexpectedly");
            }
        }
    }
}

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim();
    if email.is_empty() {
        return Err(Error::validation_field("email is required", "email"));
    }
    if !email.validate_email() {
        return Err(Error::validation_field("email address is invalid", "email"));
    }
    Ok(email.to_string())
}

fn require_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(Error::validation_field("password cannot be empty", "password"));
    }
    Ok(())
}

fn invalid_credentials() -> Error {
    Error::auth(INVALID_CREDENTIALS, AuthErrorType::InvalidCredentials)
}

fn email_taken() -> Error {
    Error::conflict("an account with this email already exists", "account")
}

fn conflict_as_email_taken(err: Error) -> Error {
    match err {
        Error::Conflict { .. } => email_taken(),
        other => other,
    }
}
