use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{new_message_id, recipient, EmailMessage, EmailSender, SendResult};

/// Sends mail through a JSON HTTP email API (`POST {from, to, subject, html}`).
#[derive(Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    from: String,
}

impl HttpMailer {
    pub fn new(url: String, api_key: Option<String>, from: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("GearHub-Mailer/1.0")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            url,
            api_key,
            from,
        }
    }
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

#[derive(Deserialize, Default)]
struct ApiResponse {
    id: Option<String>,
}

#[async_trait]
impl EmailSender for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<SendResult> {
        let to = recipient(message)?;
        let body = ApiMessage {
            from: &self.from,
            to,
            subject: message.subject.as_deref().unwrap_or_default(),
            html: message.html.as_deref().unwrap_or_default(),
        };

        let mut req = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await.context("failed to reach email API")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("email API returned error: status={}, body={}", status, body);
        }

        let parsed: ApiResponse = resp.json().await.unwrap_or_default();
        let message_id = parsed.id.unwrap_or_else(new_message_id);

        tracing::info!(to, message_id = %message_id, "sent email via HTTP API");
        Ok(SendResult {
            message_id,
            accepted: vec![to.to_string()],
            transport: "http".into(),
        })
    }
}
