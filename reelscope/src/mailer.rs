use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::info;

use common::Config;

/// Fixed submission host; STARTTLS on the submission port.
const SMTP_HOST: &str = "smtp.gmail.com";

/// What went wrong submitting the notification email. The caller can tell a
/// sent run from a failed one instead of only reading the log.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("invalid mailbox address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP submission failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Build the outbound message from the config envelope and the rendered body.
pub fn build_message(config: &Config, html: String) -> Result<Message, DeliveryError> {
    let from: Mailbox = config.email.from.parse()?;
    let to: Mailbox = config.email.to.parse()?;

    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(config.email.subject.clone())
        .header(ContentType::TEXT_HTML)
        .body(html)?;

    Ok(message)
}

/// Submit the message over STARTTLS with the configured credentials.
pub async fn send_email(config: &Config, html: String) -> Result<(), DeliveryError> {
    let message = build_message(config, html)?;

    let credentials = Credentials::new(config.smtp.username.clone(), config.smtp.password.clone());
    let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(SMTP_HOST)?
        .credentials(credentials)
        .build();

    let response = mailer.send(message).await?;
    info!(code = %response.code(), to = %config.email.to, "email submitted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{EmailConfig, FiltersConfig, Quality, RssFeedConfig, SmtpConfig};

    fn config(from: &str, to: &str) -> Config {
        Config {
            smtp: SmtpConfig {
                username: "notifier@example.com".to_string(),
                password: "hunter2".to_string(),
            },
            email: EmailConfig {
                from: from.to_string(),
                to: to.to_string(),
                subject: "New releases".to_string(),
            },
            rssfeed: RssFeedConfig {
                rss: "https://releases.example.com/rss".to_string(),
            },
            filters: FiltersConfig {
                quality: Quality::Hd1080,
            },
            fetch: None,
        }
    }

    #[test]
    fn message_builds_from_a_valid_envelope() {
        let cfg = config("Notifier <notifier@example.com>", "watcher@example.com");
        let message = build_message(&cfg, "<html></html>".to_string()).expect("build");
        let rendered = String::from_utf8(message.formatted()).expect("utf8");
        assert!(rendered.contains("Subject: New releases"));
        assert!(rendered.contains("To: watcher@example.com"));
    }

    #[test]
    fn a_bad_address_is_a_typed_failure() {
        let cfg = config("not an address", "watcher@example.com");
        match build_message(&cfg, String::new()) {
            Err(DeliveryError::Address(_)) => {}
            other => panic!("expected address error, got {:?}", other.map(|_| ())),
        }
    }
}
