//! Alert mail delivery.

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use telemetry::metrics;
use tracing::{debug, info};
use tracker_core::{Error, Result};

use crate::config::{SmtpConfig, SmtpSecurity};

/// A plain-text alert email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
}

impl EmailMessage {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Alert delivery channel.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<()>;

    /// Verifies the relay is reachable.
    async fn test_connection(&self) -> Result<bool> {
        Ok(true)
    }
}

/// SMTP mailer backed by lettre's tokio transport.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let host = config
            .host
            .as_deref()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::config("SMTP host not configured"))?;
        let from = parse_mailbox(config.sender(), "sender")?;
        let to = parse_mailbox(config.alert_to.as_deref(), "alert recipient")?;

        let builder = match config.security {
            SmtpSecurity::Starttls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| Error::config(format!("Invalid SMTP relay: {}", e)))?,
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| Error::config(format!("Invalid SMTP relay: {}", e)))?,
            SmtpSecurity::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host),
        };

        let mut builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));

        if let (Some(user), Some(pass)) = (config.username.as_ref(), config.password.as_ref()) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        info!(host = %host, port = config.port, to = %to, "SMTP mailer configured");

        Ok(Self {
            transport: builder.build(),
            from,
            to,
        })
    }
}

fn parse_mailbox(value: Option<&str>, what: &str) -> Result<Mailbox> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::config(format!("SMTP {} not configured", what)))?
        .parse()
        .map_err(|e| Error::config(format!("Invalid SMTP {}: {}", what, e)))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: EmailMessage) -> Result<()> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(message.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body)
            .map_err(|e| Error::mail(format!("Failed to build message: {}", e)))?;

        match self.transport.send(email).await {
            Ok(_) => {
                metrics().mail_sent.inc();
                debug!(subject = %message.subject, "Alert email sent");
                Ok(())
            }
            Err(e) => {
                metrics().mail_errors.inc();
                Err(Error::mail(format!("SMTP send failed: {}", e)))
            }
        }
    }

    async fn test_connection(&self) -> Result<bool> {
        self.transport
            .test_connection()
            .await
            .map_err(|e| Error::mail(format!("SMTP connection failed: {}", e)))
    }
}
