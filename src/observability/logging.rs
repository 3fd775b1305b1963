//! # Structured Logging
//!
//! Startup logging of the effective configuration.

/// Log configuration at startup
pub fn log_config_info(config: &crate::config::AppConfig) {
    tracing::info!(
        server_address = %config.server.bind_address(),
        database_in_memory = config.database.is_in_memory(),
        signing_key_configured = config.auth.tokens.jwt_secret.is_some(),
        distinct_reset_secret = config.auth.tokens.reset_secret.is_some(),
        auth_token_ttl_seconds = config.auth.tokens.auth_token_ttl_seconds,
        reset_token_ttl_seconds = config.auth.tokens.reset_token_ttl_seconds,
        mail_relay_configured = config.mail.relay_url.is_some(),
        metrics_enabled = %config.observability.enable_metrics,
        tracing_enabled = %config.observability.enable_tracing,
        "ServiceHub account service configuration"
    );
}
