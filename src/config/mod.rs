//! # Configuration Management
//!
//! Loads [`AppConfig`] from `SERVICEHUB_*` environment variables. Secrets and
//! cost parameters are read once here and handed to constructors; nothing in
//! the account workflow reads the environment directly.

pub mod settings;

use std::str::FromStr;

pub use settings::{
    AppConfig, AuthConfig, DatabaseConfig, HashingConfig, MailConfig, ObservabilityConfig,
    ServerConfig, TokenConfig,
};

use crate::errors::{Result, ServiceHubError};

const ENV_PREFIX: &str = "SERVICEHUB_";

fn env_var(key: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{key}")).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_var(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| {
            ServiceHubError::config(format!("Invalid value for {ENV_PREFIX}{key}: {e}"))
        }),
        None => Ok(default),
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    env_var(key)
        .map(|v| v.trim().eq_ignore_ascii_case("true") || v.trim() == "1")
        .unwrap_or(default)
}

impl AppConfig {
    /// Create configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = AppConfig::default();

        let server = ServerConfig {
            host: env_var("HOST").unwrap_or(defaults.server.host),
            port: env_parse("PORT", defaults.server.port)?,
            timeout_seconds: env_parse("REQUEST_TIMEOUT_SECONDS", defaults.server.timeout_seconds)?,
            enable_cors: env_bool("ENABLE_CORS", defaults.server.enable_cors),
            cors_origins: env_var("CORS_ORIGINS")
                .map(|v| v.split(',').map(|o| o.trim().to_string()).collect())
                .unwrap_or(defaults.server.cors_origins),
        };

        let database = DatabaseConfig {
            url: env_var("DATABASE_URL").unwrap_or(defaults.database.url),
            max_connections: env_parse("DATABASE_MAX_CONNECTIONS", defaults.database.max_connections)?,
            min_connections: env_parse("DATABASE_MIN_CONNECTIONS", defaults.database.min_connections)?,
            connect_timeout_seconds: env_parse(
                "DATABASE_CONNECT_TIMEOUT_SECONDS",
                defaults.database.connect_timeout_seconds,
            )?,
            idle_timeout_seconds: env_parse(
                "DATABASE_IDLE_TIMEOUT_SECONDS",
                defaults.database.idle_timeout_seconds,
            )?,
            auto_migrate: env_bool("DATABASE_AUTO_MIGRATE", defaults.database.auto_migrate),
        };

        let tokens = TokenConfig {
            jwt_secret: env_var("JWT_SECRET"),
            reset_secret: env_var("RESET_TOKEN_SECRET"),
            auth_token_ttl_seconds: env_parse(
                "AUTH_TOKEN_TTL_SECONDS",
                defaults.auth.tokens.auth_token_ttl_seconds,
            )?,
            reset_token_ttl_seconds: env_parse(
                "RESET_TOKEN_TTL_SECONDS",
                defaults.auth.tokens.reset_token_ttl_seconds,
            )?,
            leeway_seconds: env_parse("TOKEN_LEEWAY_SECONDS", defaults.auth.tokens.leeway_seconds)?,
        };

        let hashing = HashingConfig {
            memory_cost_kib: env_parse(
                "ARGON2_MEMORY_COST_KIB",
                defaults.auth.hashing.memory_cost_kib,
            )?,
            iterations: env_parse("ARGON2_ITERATIONS", defaults.auth.hashing.iterations)?,
            parallelism: env_parse("ARGON2_PARALLELISM", defaults.auth.hashing.parallelism)?,
        };

        let mail = MailConfig {
            server_url: env_var("SERVER_URL"),
            relay_url: env_var("MAIL_RELAY_URL"),
            relay_secret: env_var("MAIL_RELAY_SECRET"),
            from_address: env_var("MAIL_FROM").unwrap_or(defaults.mail.from_address),
            timeout_seconds: env_parse("MAIL_TIMEOUT_SECONDS", defaults.mail.timeout_seconds)?,
        };

        let observability = ObservabilityConfig {
            service_name: env_var("SERVICE_NAME").unwrap_or(defaults.observability.service_name),
            service_namespace: env_var("SERVICE_NAMESPACE")
                .unwrap_or(defaults.observability.service_namespace),
            environment: env_var("ENVIRONMENT").unwrap_or(defaults.observability.environment),
            log_level: env_var("LOG_LEVEL").unwrap_or(defaults.observability.log_level),
            json_logs: env_bool("JSON_LOGS", defaults.observability.json_logs),
            enable_tracing: env_bool("ENABLE_TRACING", defaults.observability.enable_tracing),
            otlp_endpoint: env_var("OTLP_ENDPOINT")
                .or_else(|| std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok()),
            enable_metrics: env_bool("ENABLE_METRICS", defaults.observability.enable_metrics),
            metrics_port: env_parse("METRICS_PORT", defaults.observability.metrics_port)?,
        };

        let config = AppConfig {
            server,
            database,
            auth: AuthConfig { tokens, hashing },
            mail,
            observability,
        };
        config.validate()?;
        Ok(config)
    }
}
