//! Enrollment notifications.
//!
//! Delivery is attempted only after the enrollment change is stored and never
//! rolls it back. The created notice always runs as a detached task; the
//! cancellation notice is detached unless [`CancellationDelivery::Awaited`] is
//! configured, in which case a delivery failure is reported to the caller.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::domain::errors::{DomainError, DomainResult};

/// SMTP settings, loaded from the TOML file named by `EMAIL_CONFIG`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_server: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            username: String::new(),
            password: String::new(),
            from_email: String::new(),
        }
    }
}

/// Outbound message channel
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to_email: &str, subject: &str, body: &str) -> Result<()>;
}

/// Sends mail through an SMTP relay with STARTTLS
pub struct SmtpNotifier {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotifier {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        info!("📧 Initializing email service for SMTP server: {}:{}", config.smtp_server, config.smtp_port);

        let from = config
            .from_email
            .parse::<Mailbox>()
            .context("Failed to parse from email")?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server)
            .context("Failed to create SMTP relay")?
            .port(config.smtp_port)
            .credentials(Credentials::new(config.username.clone(), config.password.clone()))
            .build();

        Ok(Self { from, transport })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, to_email: &str, subject: &str, body: &str) -> Result<()> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(to_email.parse::<Mailbox>().context("Failed to parse recipient email")?)
            .subject(subject)
            .body(body.to_string())
            .context("Failed to build email")?;

        self.transport.send(email).await.context("Failed to send email")?;
        info!("📧 Email \"{}\" sent to {}", subject, to_email);
        Ok(())
    }
}

/// Writes messages to the log instead of sending them
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, to_email: &str, subject: &str, body: &str) -> Result<()> {
        info!("📧 (not sent) to={} subject=\"{}\" body=\"{}\"", to_email, subject, body);
        Ok(())
    }
}

/// How the cancellation notice is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CancellationDelivery {
    #[default]
    Detached,
    Awaited,
}

#[derive(Clone)]
pub struct NotificationService {
    notifier: Arc<dyn Notifier>,
    cancellation_delivery: CancellationDelivery,
}

impl NotificationService {
    pub fn new(notifier: Arc<dyn Notifier>, cancellation_delivery: CancellationDelivery) -> Self {
        Self {
            notifier,
            cancellation_delivery,
        }
    }

    /// Fire-and-forget notice for a new enrollment
    pub fn enrollment_created(&self, to_email: &str, child_name: &str, club_name: &str) {
        let subject = "Enrollment confirmation".to_string();
        let body = format!("You have enrolled {} in the club \"{}\"", child_name, club_name);
        self.spawn_send(to_email.to_string(), subject, body);
    }

    /// Notice for a cancelled enrollment, delivered per configuration
    pub async fn enrollment_cancelled(&self, to_email: &str, child_name: &str, club_name: &str) -> DomainResult<()> {
        let subject = "Enrollment cancelled".to_string();
        let body = format!("You have cancelled the enrollment of {} in the club \"{}\"", child_name, club_name);

        match self.cancellation_delivery {
            CancellationDelivery::Detached => {
                self.spawn_send(to_email.to_string(), subject, body);
                Ok(())
            }
            CancellationDelivery::Awaited => self
                .notifier
                .send(to_email, &subject, &body)
                .await
                .map_err(|e| {
                    error!("Failed to send cancellation email to {}: {:#}", to_email, e);
                    DomainError::Internal(e)
                }),
        }
    }

    fn spawn_send(&self, to_email: String, subject: String, body: String) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(e) = notifier.send(&to_email, &subject, &body).await {
                error!("Failed to send \"{}\" to {}: {:#}", subject, to_email, e);
            }
        });
    }
}
