//! Outbound email for gear workflows.
//!
//! The transport is picked from configuration: SMTP when `SMTP_HOST` is set,
//! an HTTP email API when `EMAIL_API_URL` is set, otherwise a sender that only
//! logs.

pub mod http;
pub mod smtp;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Payload accepted by the email endpoint. Fields are forwarded as given;
/// whether a missing field is an error is up to the sender.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: Option<String>,
    pub subject: Option<String>,
    pub html: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendResult {
    pub message_id: String,
    pub accepted: Vec<String>,
    pub transport: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<SendResult>;
}

/// The recipient, or an error naming what is missing.
pub fn recipient(message: &EmailMessage) -> anyhow::Result<&str> {
    match message.to.as_deref().map(str::trim) {
        Some(to) if !to.is_empty() => Ok(to),
        _ => anyhow::bail!("missing recipient address"),
    }
}

fn new_message_id() -> String {
    format!("<{}@gearhub>", uuid::Uuid::new_v4())
}

/// Sender used when no transport is configured: logs and reports success.
#[derive(Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl EmailSender for LogMailer {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<SendResult> {
        let to = recipient(message)?;
        let message_id = new_message_id();
        tracing::info!(
            to,
            subject = message.subject.as_deref().unwrap_or(""),
            message_id = %message_id,
            "no mail transport configured, email logged only"
        );
        Ok(SendResult {
            message_id,
            accepted: vec![to.to_string()],
            transport: "log".into(),
        })
    }
}

pub fn from_config(cfg: &Config) -> anyhow::Result<Arc<dyn EmailSender>> {
    if let Some(smtp) = &cfg.smtp {
        tracing::info!(host = %smtp.host, port = smtp.port, "using SMTP mail transport");
        return Ok(Arc::new(smtp::SmtpMailer::new(smtp, &cfg.email_from)?));
    }
    if let Some(url) = &cfg.email_api_url {
        tracing::info!(url = %url, "using HTTP email API transport");
        return Ok(Arc::new(http::HttpMailer::new(
            url.clone(),
            cfg.email_api_key.clone(),
            cfg.email_from.clone(),
        )));
    }
    tracing::warn!("no mail transport configured; emails will only be logged");
    Ok(Arc::new(LogMailer))
}
