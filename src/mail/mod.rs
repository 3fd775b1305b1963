//! Password-reset mail delivery.
//!
//! [`LogMailSender`] writes the reset link to the log and is the default for
//! local development. [`HttpMailSender`] hands the message to an HTTP mail
//! relay, signing the body with HMAC-SHA256 when a relay secret is configured.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use thiserror::Error;
use tracing::{info, instrument, warn};
use url::Url;

use crate::config::MailConfig;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the relay request signature
pub const SIGNATURE_HEADER: &str = "X-ServiceHub-Signature";

const RESET_PATH: &str = "reset-password";
const RESET_SUBJECT: &str = "Reset your password";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("server url is not set")]
    ServerUrlNotSet,
    #[error("failed to deliver mail: {0}")]
    DeliveryFailed(String),
}

/// Delivery of account mail.
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send_password_reset_email(&self, email: &str, token: &str) -> Result<(), MailError>;
}

/// Build the link a user follows to reset their password.
pub fn reset_link(server_url: Option<&str>, token: &str) -> Result<Url, MailError> {
    let base = server_url.ok_or(MailError::ServerUrlNotSet)?;
    let mut url = Url::parse(base).map_err(|_| MailError::ServerUrlNotSet)?;

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    let mut url = url.join(RESET_PATH).map_err(|_| MailError::ServerUrlNotSet)?;
    url.query_pairs_mut().append_pair("token", token);
    Ok(url)
}

/// Pick the sender for the given configuration.
pub fn build_mail_sender(config: &MailConfig) -> Result<Arc<dyn MailSender>, MailError> {
    if config.server_url.is_none() {
        warn!("SERVICEHUB_SERVER_URL is not set; password reset mail cannot be sent");
    }

    match config.relay_url {
        Some(_) => Ok(Arc::new(HttpMailSender::new(config)?)),
        None => Ok(Arc::new(LogMailSender::new(config))),
    }
}

/// Writes reset links to the log instead of sending mail.
#[derive(Debug, Clone)]
pub struct LogMailSender {
    server_url: Option<String>,
}

impl LogMailSender {
    pub fn new(config: &MailConfig) -> Self {
        Self { server_url: config.server_url.clone() }
    }
}

#[async_trait]
impl MailSender for LogMailSender {
    #[instrument(skip(self, token), name = "mail_log_password_reset")]
    async fn send_password_reset_email(&self, email: &str, token: &str) -> Result<(), MailError> {
        let link = reset_link(self.server_url.as_deref(), token)?;
        info!(to = %email, reset_link = %link, "Password reset mail (log delivery)");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: String,
    reset_url: &'a str,
}

/// Posts mail to an HTTP relay as JSON.
#[derive(Debug, Clone)]
pub struct HttpMailSender {
    client: reqwest::Client,
    relay_url: String,
    relay_secret: Option<String>,
    from_address: String,
    server_url: Option<String>,
}

impl HttpMailSender {
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let relay_url = config
            .relay_url
            .clone()
            .ok_or_else(|| MailError::DeliveryFailed("mail relay url is not set".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| MailError::DeliveryFailed(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            relay_url,
            relay_secret: config.relay_secret.clone(),
            from_address: config.from_address.clone(),
            server_url: config.server_url.clone(),
        })
    }

    fn sign(&self, body: &[u8]) -> Result<Option<String>, MailError> {
        let Some(secret) = &self.relay_secret else {
            return Ok(None);
        };
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| MailError::DeliveryFailed(format!("invalid relay secret: {e}")))?;
        mac.update(body);
        Ok(Some(format!("sha256={}", hex::encode(mac.finalize().into_bytes()))))
    }
}

#[async_trait]
impl MailSender for HttpMailSender {
    #[instrument(skip(self, token), fields(relay_url = %self.relay_url), name = "mail_relay_password_reset")]
    async fn send_password_reset_email(&self, email: &str, token: &str) -> Result<(), MailError> {
        let link = reset_link(self.server_url.as_deref(), token)?;
        let message = RelayMessage {
            from: &self.from_address,
            to: email,
            subject: RESET_SUBJECT,
            text: format!(
                "A password reset was requested for your account.\n\nOpen this link to choose a new password:\n{link}\n\nIf you did not request this, you can ignore this message."
            ),
            reset_url: link.as_str(),
        };
        let body = serde_json::to_vec(&message)
            .map_err(|e| MailError::DeliveryFailed(format!("failed to encode message: {e}")))?;

        let mut request =
            self.client.post(&self.relay_url).header("Content-Type", "application/json");
        if let Some(signature) = self.sign(&body)? {
            request = request.header(SIGNATURE_HEADER, signature);
        }

        let response = request.body(body).send().await.map_err(|e| {
            warn!(error = %e, "Mail relay request failed");
            MailError::DeliveryFailed(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status_code = status.as_u16(), "Mail relay rejected message");
            return Err(MailError::DeliveryFailed(format!("relay returned status {status}")));
        }

        info!(status_code = status.as_u16(), "Password reset mail handed to relay");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_link_appends_path_and_token() {
        let link = reset_link(Some("https://hub.example.com"), "abc.def").unwrap();
        assert_eq!(link.as_str(), "https://hub.example.com/reset-password?token=abc.def");

        let nested = reset_link(Some("https://hub.example.com/app"), "t").unwrap();
        assert_eq!(nested.as_str(), "https://hub.example.com/app/reset-password?token=t");
    }

    #[test]
    fn reset_link_requires_server_url() {
        assert!(matches!(reset_link(None, "t"), Err(MailError::ServerUrlNotSet)));
        assert!(matches!(reset_link(Some("not a url"), "t"), Err(MailError::ServerUrlNotSet)));
    }

    #[tokio::test]
    async fn log_sender_fails_without_server_url() {
        let sender = LogMailSender::new(&MailConfig::default());
        let err = sender.send_password_reset_email("a@x.com", "t").await.unwrap_err();
        assert!(matches!(err, MailError::ServerUrlNotSet));
    }

    #[test]
    fn signature_is_stable_for_same_body() {
        let config = MailConfig {
            relay_url: Some("http://localhost:1/send".to_string()),
            relay_secret: Some("relay-secret".to_string()),
            ..Default::default()
        };
        let sender = HttpMailSender::new(&config).unwrap();

        let first = sender.sign(b"{}").unwrap().unwrap();
        let second = sender.sign(b"{}").unwrap().unwrap();
        assert_eq!(first, second);
        assert!(first.starts_with("sha256="));
        assert_ne!(first, sender.sign(b"[]").unwrap().unwrap());
    }
}
