use anyhow::Context;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{new_message_id, recipient, EmailMessage, EmailSender, SendResult};
use crate::config::SmtpConfig;

/// Sends mail over SMTP with STARTTLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig, from: &str) -> anyhow::Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .with_context(|| format!("invalid SMTP host {}", config.host))?
            .port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let from = from
            .parse::<Mailbox>()
            .with_context(|| format!("invalid sender address {}", from))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    fn build_message(&self, message: &EmailMessage, message_id: &str) -> anyhow::Result<Message> {
        let to = recipient(message)?;
        let to = to
            .parse::<Mailbox>()
            .with_context(|| format!("invalid recipient address {}", to))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone().unwrap_or_default())
            .message_id(Some(message_id.to_string()))
            .header(ContentType::TEXT_HTML)
            .body(message.html.clone().unwrap_or_default())
            .context("failed to build email")?;
        Ok(email)
    }
}

#[async_trait]
impl EmailSender for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<SendResult> {
        let message_id = new_message_id();
        let email = self.build_message(message, &message_id)?;
        let accepted: Vec<String> = email
            .envelope()
            .to()
            .iter()
            .map(|addr| addr.to_string())
            .collect();

        let response = self
            .transport
            .send(email)
            .await
            .context("SMTP delivery failed")?;

        tracing::info!(
            message_id = %message_id,
            code = %response.code(),
            "sent email via SMTP"
        );

        Ok(SendResult {
            message_id,
            accepted,
            transport: "smtp".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mailer() -> SmtpMailer {
        let config = SmtpConfig {
            host: "smtp.example.com".into(),
            port: 587,
            username: Some("gearhub".into()),
            password: Some("secret".into()),
        };
        SmtpMailer::new(&config, "GearHub <no-reply@example.com>").unwrap()
    }

    #[tokio::test]
    async fn test_build_message_sets_recipient_and_subject() {
        let msg = EmailMessage {
            to: Some("crew@example.com".into()),
            subject: Some("Booking confirmed".into()),
            html: Some("<b>See you Monday</b>".into()),
        };
        let email = mailer().build_message(&msg, "<id@gearhub>").unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();
        assert!(raw.contains("To: crew@example.com"));
        assert!(raw.contains("Subject: Booking confirmed"));
        assert!(raw.contains("text/html"));
    }

    #[tokio::test]
    async fn test_invalid_recipient_is_rejected() {
        let msg = EmailMessage {
            to: Some("not an address".into()),
            ..Default::default()
        };
        let err = mailer().build_message(&msg, "<id@gearhub>").unwrap_err();
        assert!(err.to_string().contains("invalid recipient address"));
    }

    #[tokio::test]
    async fn test_invalid_sender_is_rejected() {
        let config = SmtpConfig {
            host: "smtp.example.com".into(),
            port: 587,
            username: None,
            password: None,
        };
        assert!(SmtpMailer::new(&config, "nobody").is_err());
    }
}
