//! # Configuration Settings
//!
//! Defines the configuration structure for the ServiceHub account service.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::{Result, ServiceHubError};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct AppConfig {
    /// Server configuration
    #[validate(nested)]
    pub server: ServerConfig,

    /// Database configuration
    #[validate(nested)]
    pub database: DatabaseConfig,

    /// Token and password hashing configuration
    #[validate(nested)]
    pub auth: AuthConfig,

    /// Password reset mail configuration
    #[validate(nested)]
    pub mail: MailConfig,

    /// Observability configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(ServiceHubError::from)?;
        self.validate_custom()
    }

    fn validate_custom(&self) -> Result<()> {
        if !self.database.url.starts_with("sqlite:") {
            return Err(ServiceHubError::validation("Database URL must start with 'sqlite:'"));
        }

        if self.auth.tokens.reset_token_ttl_seconds > self.auth.tokens.auth_token_ttl_seconds {
            return Err(ServiceHubError::validation(
                "Password reset tokens must not outlive auth tokens",
            ));
        }

        if let Some(secret) = &self.auth.tokens.jwt_secret {
            if secret.len() < MIN_SECRET_LEN {
                return Err(ServiceHubError::validation(format!(
                    "JWT secret must be at least {} characters long",
                    MIN_SECRET_LEN
                )));
            }
        }

        Ok(())
    }
}

/// Minimum accepted length for signing secrets
pub const MIN_SECRET_LEN: usize = 32;

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    /// Server bind address
    #[validate(length(min = 1, message = "Host cannot be empty"))]
    pub host: String,

    /// Server port
    #[validate(range(min = 1, max = 65535, message = "Port must be between 1 and 65535"))]
    pub port: u16,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300, message = "Timeout must be between 1 and 300 seconds"))]
    pub timeout_seconds: u64,

    /// Enable CORS
    pub enable_cors: bool,

    /// CORS allowed origins (empty = allow all)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            timeout_seconds: 30,
            enable_cors: true,
            cors_origins: vec![],
        }
    }
}

impl ServerConfig {
    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[validate(length(min = 1, message = "Database URL cannot be empty"))]
    pub url: String,

    /// Maximum number of connections in the pool
    #[validate(range(min = 1, max = 100, message = "Max connections must be between 1 and 100"))]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    #[validate(range(min = 0, max = 50, message = "Min connections must be between 0 and 50"))]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[validate(range(
        min = 1,
        max = 60,
        message = "Connect timeout must be between 1 and 60 seconds"
    ))]
    pub connect_timeout_seconds: u64,

    /// Idle timeout in seconds (0 = no timeout)
    pub idle_timeout_seconds: u64,

    /// Run embedded migrations when the pool is created
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://servicehub.db".to_string(),
            max_connections: 10,
            min_connections: 0,
            connect_timeout_seconds: 10,
            idle_timeout_seconds: 600,
            auto_migrate: true,
        }
    }
}

impl DatabaseConfig {
    /// Get connection timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    /// Get idle timeout as Duration (None if 0)
    pub fn idle_timeout(&self) -> Option<Duration> {
        if self.idle_timeout_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.idle_timeout_seconds))
        }
    }

    /// In-memory databases only live as long as their single connection
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:")
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct AuthConfig {
    #[validate(nested)]
    pub tokens: TokenConfig,

    #[validate(nested)]
    pub hashing: HashingConfig,
}

/// Signing secrets and lifetimes for bearer tokens.
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct TokenConfig {
    /// Secret used to sign auth tokens. Token issuance fails while unset.
    #[serde(skip_serializing)]
    pub jwt_secret: Option<String>,

    /// Optional distinct secret for password-reset tokens (falls back to `jwt_secret`)
    #[serde(skip_serializing)]
    pub reset_secret: Option<String>,

    /// Auth token lifetime in seconds
    #[validate(range(min = 60, message = "Auth token TTL must be at least 60 seconds"))]
    pub auth_token_ttl_seconds: i64,

    /// Password-reset token lifetime in seconds
    #[validate(range(min = 60, message = "Reset token TTL must be at least 60 seconds"))]
    pub reset_token_ttl_seconds: i64,

    /// Clock skew tolerance applied when checking expiry
    #[validate(range(min = 0, max = 300, message = "Leeway must be between 0 and 300 seconds"))]
    pub leeway_seconds: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            reset_secret: None,
            auth_token_ttl_seconds: 24 * 60 * 60,
            reset_token_ttl_seconds: 15 * 60,
            leeway_seconds: 30,
        }
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("reset_secret", &self.reset_secret.as_ref().map(|_| "<redacted>"))
            .field("auth_token_ttl_seconds", &self.auth_token_ttl_seconds)
            .field("reset_token_ttl_seconds", &self.reset_token_ttl_seconds)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

/// Argon2id cost parameters used for new password hashes.
///
/// Existing hashes carry their own parameters, so changing these values only
/// affects hashes produced after the change.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HashingConfig {
    #[validate(range(min = 8, max = 1048576, message = "Memory cost must be 8 KiB to 1 GiB"))]
    pub memory_cost_kib: u32,

    #[validate(range(min = 1, max = 16, message = "Iterations must be between 1 and 16"))]
    pub iterations: u32,

    #[validate(range(min = 1, max = 16, message = "Parallelism must be between 1 and 16"))]
    pub parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self { memory_cost_kib: 19 * 1024, iterations: 2, parallelism: 1 }
    }
}

/// Password-reset mail configuration
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct MailConfig {
    /// Public base URL used to build reset links
    #[validate(url(message = "Server URL must be a valid URL"))]
    pub server_url: Option<String>,

    /// HTTP mail relay endpoint. When unset, reset links are written to the log.
    #[validate(url(message = "Mail relay URL must be a valid URL"))]
    pub relay_url: Option<String>,

    /// Shared secret used to sign relay requests
    #[serde(skip_serializing)]
    pub relay_secret: Option<String>,

    /// Sender address passed to the relay
    #[validate(email(message = "From address must be a valid email"))]
    pub from_address: String,

    /// Relay request timeout in seconds
    #[validate(range(min = 1, max = 60))]
    pub timeout_seconds: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            relay_url: None,
            relay_secret: None,
            from_address: "no-reply@servicehub.local".to_string(),
            timeout_seconds: 10,
        }
    }
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("server_url", &self.server_url)
            .field("relay_url", &self.relay_url)
            .field("relay_secret", &self.relay_secret.as_ref().map(|_| "<redacted>"))
            .field("from_address", &self.from_address)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    pub service_namespace: String,

    pub environment: String,

    /// Default log filter when `RUST_LOG` is unset
    #[validate(length(min = 1))]
    pub log_level: String,

    /// Emit logs as JSON
    pub json_logs: bool,

    /// Export spans over OTLP
    pub enable_tracing: bool,

    /// OTLP gRPC endpoint
    pub otlp_endpoint: Option<String>,

    /// Serve Prometheus metrics
    pub enable_metrics: bool,

    pub metrics_port: u16,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "servicehub-api".to_string(),
            service_namespace: "servicehub".to_string(),
            environment: "development".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            enable_tracing: false,
            otlp_endpoint: None,
            enable_metrics: false,
            metrics_port: 9090,
        }
    }
}

impl ObservabilityConfig {
    /// Prometheus listener address, if metrics are served
    pub fn metrics_bind_address(&self) -> Option<String> {
        if self.enable_metrics && self.metrics_port != 0 {
            Some(format!("0.0.0.0:{}", self.metrics_port))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.auth.tokens.jwt_secret = Some("x".repeat(MIN_SECRET_LEN));
        config
    }

    #[test]
    fn default_config_is_valid() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn short_secret_is_rejected() {
        let mut config = valid_config();
        config.auth.tokens.jwt_secret = Some("short".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn reset_tokens_must_be_shorter_lived() {
        let mut config = valid_config();
        config.auth.tokens.reset_token_ttl_seconds = config.auth.tokens.auth_token_ttl_seconds + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_sqlite_url_is_rejected() {
        let mut config = valid_config();
        config.database.url = "postgresql://localhost/servicehub".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = valid_config();
        let rendered = format!("{:?}", config.auth.tokens);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains(&"x".repeat(MIN_SECRET_LEN)));
    }

    #[test]
    fn idle_timeout_zero_disables() {
        let config = DatabaseConfig { idle_timeout_seconds: 0, ..Default::default() };
        assert!(config.idle_timeout().is_none());
    }
}
