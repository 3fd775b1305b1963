//! Startup wiring for the ServiceHub account service
//!
//! Builds the account workflow and its collaborators from [`AppConfig`] and a
//! connected pool. Secrets are checked here so a misconfigured server refuses
//! to start instead of failing its first login.

use std::sync::Arc;

use tracing::info;

use crate::api::ApiState;
use crate::auth::{Argon2Hasher, JwtTokenService, TokenService};
use crate::config::AppConfig;
use crate::errors::{Error, Result};
use crate::mail::build_mail_sender;
use crate::services::AccountService;
use crate::storage::{DbPool, SqlxAccountRepository};

/// Assemble the shared API state.
///
/// Fails when no signing secret is configured.
pub fn build_api_state(config: &AppConfig, pool: DbPool) -> Result<ApiState> {
    if config.auth.tokens.jwt_secret.is_none() {
        return Err(Error::config(
            "SERVICEHUB_JWT_SECRET must be set before the API server can issue tokens",
        ));
    }

    let tokens: Arc<dyn TokenService> =
        Arc::new(JwtTokenService::new(config.auth.tokens.clone()));
    let hasher = Arc::new(Argon2Hasher::new(&config.auth.hashing)?);
    let mailer = build_mail_sender(&config.mail)?;
    let accounts = Arc::new(SqlxAccountRepository::new(pool.clone()));

    let account_service =
        Arc::new(AccountService::new(accounts, hasher, tokens.clone(), mailer));

    info!(
        mail_relay = config.mail.relay_url.is_some(),
        "Account service initialized"
    );

    Ok(ApiState { accounts: account_service, tokens, pool })
}
