//! Digest delivery: SMTP for real runs, stdout for `--dry-run`.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use shinbun_core::{Delivery, DeliveryError, DeliveryOutcome};
use shinbun_settings::EmailSettings;

#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub from: Option<String>,
    pub to: Vec<String>,
}

impl From<&EmailSettings> for SmtpConfig {
    fn from(email: &EmailSettings) -> Self {
        Self {
            host: email.smtp_host.clone(),
            port: email.smtp_port,
            username: email.smtp_user.clone(),
            password: email.smtp_password.clone().map(SecretString::from),
            from: email.from.clone(),
            to: email.to.clone(),
        }
    }
}

/// Sends the digest as a plain-text mail over STARTTLS.
pub struct SmtpDelivery {
    config: SmtpConfig,
}

impl SmtpDelivery {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn recipients(&self) -> Result<Vec<Mailbox>, DeliveryError> {
        self.config
            .to
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<Mailbox>()
                    .map_err(|e| DeliveryError::Config(format!("invalid recipient {s:?}: {e}")))
            })
            .collect()
    }

    fn sender(&self) -> Result<Mailbox, DeliveryError> {
        let from = self
            .config
            .from
            .as_deref()
            .or(self.config.username.as_deref())
            .ok_or_else(|| DeliveryError::Config("no sender address configured".into()))?;
        from.parse::<Mailbox>()
            .map_err(|e| DeliveryError::Config(format!("invalid sender {from:?}: {e}")))
    }
}

#[async_trait]
impl Delivery for SmtpDelivery {
    async fn deliver(&self, subject: &str, body: &str) -> Result<DeliveryOutcome, DeliveryError> {
        let Some(host) = self.config.host.as_deref().map(str::trim).filter(|h| !h.is_empty()) else {
            info!("no SMTP host configured, not sending digest");
            return Ok(DeliveryOutcome::Skipped("no SMTP host configured".into()));
        };
        let to = self.recipients()?;
        if to.is_empty() {
            info!("no recipients configured, not sending digest");
            return Ok(DeliveryOutcome::Skipped("no recipients configured".into()));
        }

        let mut builder = lettre::Message::builder()
            .from(self.sender()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN);
        for mailbox in &to {
            builder = builder.to(mailbox.clone());
        }
        let message = builder
            .body(body.to_string())
            .map_err(|e| DeliveryError::Config(format!("build message: {e}")))?;

        let mut transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| DeliveryError::Config(format!("smtp relay {host}: {e}")))?
            .port(self.config.port);
        if let (Some(user), Some(password)) = (&self.config.username, &self.config.password) {
            transport = transport.credentials(Credentials::new(
                user.clone(),
                password.expose_secret().to_string(),
            ));
        }

        transport
            .build()
            .send(message)
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        info!(host, recipients = to.len(), "digest mailed");
        Ok(DeliveryOutcome::Sent { recipients: to.len() })
    }
}

/// Announces what would have been sent. The body is already on stdout.
pub struct StdoutDelivery;

#[async_trait]
impl Delivery for StdoutDelivery {
    async fn deliver(&self, subject: &str, _body: &str) -> Result<DeliveryOutcome, DeliveryError> {
        println!("\n(dry run) would send: {subject}");
        Ok(DeliveryOutcome::Skipped("dry run".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SmtpConfig {
        SmtpConfig {
            host: Some("smtp.example.com".into()),
            port: 587,
            username: Some("digest@example.com".into()),
            password: Some(SecretString::from("hunter2")),
            from: None,
            to: vec!["team@example.com".into()],
        }
    }

    #[tokio::test]
    async fn no_host_skips() {
        let delivery = SmtpDelivery::new(SmtpConfig {
            host: None,
            ..config()
        });
        let outcome = delivery.deliver("s", "b").await.unwrap();
        assert!(matches!(outcome, DeliveryOutcome::Skipped(_)));

        let blank = SmtpDelivery::new(SmtpConfig {
            host: Some("  ".into()),
            ..config()
        });
        assert!(matches!(blank.deliver("s", "b").await.unwrap(), DeliveryOutcome::Skipped(_)));
    }

    #[tokio::test]
    async fn no_recipients_skips() {
        let delivery = SmtpDelivery::new(SmtpConfig {
            to: vec![" ".into()],
            ..config()
        });
        assert_eq!(
            delivery.deliver("s", "b").await.unwrap(),
            DeliveryOutcome::Skipped("no recipients configured".into())
        );
    }

    #[tokio::test]
    async fn bad_recipient_is_config_error() {
        let delivery = SmtpDelivery::new(SmtpConfig {
            to: vec!["not an address".into()],
            ..config()
        });
        let err = delivery.deliver("s", "b").await.unwrap_err();
        assert!(matches!(err, DeliveryError::Config(_)));
    }

    #[test]
    fn sender_falls_back_to_username() {
        let delivery = SmtpDelivery::new(config());
        assert_eq!(delivery.sender().unwrap().email.to_string(), "digest@example.com");

        let explicit = SmtpDelivery::new(SmtpConfig {
            from: Some("Shinbun <news@example.com>".into()),
            ..config()
        });
        assert_eq!(explicit.sender().unwrap().email.to_string(), "news@example.com");

        let none = SmtpDelivery::new(SmtpConfig {
            from: None,
            username: None,
            ..config()
        });
        assert!(matches!(none.sender(), Err(DeliveryError::Config(_))));
    }

    #[test]
    fn config_from_settings() {
        let email = EmailSettings {
            smtp_host: Some("mail.local".into()),
            smtp_password: Some("pw".into()),
            to: vec!["a@example.com".into()],
            ..EmailSettings::default()
        };
        let config = SmtpConfig::from(&email);
        assert_eq!(config.host.as_deref(), Some("mail.local"));
        assert_eq!(config.port, 587);
        assert_eq!(config.password.as_ref().map(|p| p.expose_secret().to_string()), Some("pw".to_string()));
    }

    #[tokio::test]
    async fn stdout_is_a_skip() {
        let outcome = StdoutDelivery.deliver("subject", "body").await.unwrap();
        assert_eq!(outcome, DeliveryOutcome::Skipped("dry run".into()));
    }
}
