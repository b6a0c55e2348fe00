//! Outgoing email for password reset codes.
//!
//! [`Mailer::Smtp`] relays through the configured SMTP server. Without SMTP
//! configuration the server falls back to [`Mailer::Log`], which logs the
//! message and keeps it in a small in-memory outbox.

use crate::config::SmtpConfig;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Messages retained by the logging mailer.
const OUTBOX_CAPACITY: usize = 64;

/// Mail error types.
#[derive(Debug, Error)]
pub enum MailError {
    /// Malformed sender or recipient.
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    /// Message could not be assembled.
    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),
    /// Relay refused or was unreachable.
    #[error("smtp transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// A rendered email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub body: String,
}

impl OutgoingMail {
    /// Renders the password reset email.
    #[must_use]
    pub fn password_reset(to: &str, otp: &str, ttl_minutes: u64) -> Self {
        Self {
            to: to.to_string(),
            subject: "Your password reset code".to_string(),
            body: format!(
                "Your one-time password reset code is {}.\n\nIt expires in {} minutes. \
                 If you did not request a reset, ignore this email.",
                otp, ttl_minutes
            ),
        }
    }
}

/// SMTP relay sender.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    /// Builds a STARTTLS relay transport.
    ///
    /// # Errors
    /// Returns error if the relay host is invalid.
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }

    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.from.parse()?)
            .to(mail.to.parse()?)
            .subject(mail.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body.clone())?;

        self.transport.send(message).await?;
        Ok(())
    }
}

/// Development sender that only logs.
#[derive(Debug, Clone, Default)]
pub struct LogMailer {
    outbox: Arc<Mutex<VecDeque<OutgoingMail>>>,
}

impl LogMailer {
    /// Creates an empty logging mailer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent messages, oldest first.
    #[must_use]
    pub fn outbox(&self) -> Vec<OutgoingMail> {
        self.outbox.lock().iter().cloned().collect()
    }

    fn record(&self, mail: &OutgoingMail) {
        info!(to = %mail.to, subject = %mail.subject, "SMTP not configured, logging email instead");
        let mut outbox = self.outbox.lock();
        if outbox.len() == OUTBOX_CAPACITY {
            outbox.pop_front();
        }
        outbox.push_back(mail.clone());
    }
}

/// Email sender used by the API.
#[derive(Clone)]
pub enum Mailer {
    /// Real SMTP delivery.
    Smtp(SmtpMailer),
    /// Log-only delivery.
    Log(LogMailer),
}

impl Mailer {
    /// Picks SMTP when configured, logging otherwise.
    ///
    /// # Errors
    /// Returns error if the SMTP configuration is invalid.
    pub fn from_config(smtp: Option<&SmtpConfig>) -> Result<Self, MailError> {
        match smtp {
            Some(config) => Ok(Self::Smtp(SmtpMailer::new(config)?)),
            None => Ok(Self::Log(LogMailer::new())),
        }
    }

    /// Sends an email.
    ///
    /// # Errors
    /// Returns error if SMTP delivery fails.
    pub async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        match self {
            Self::Smtp(smtp) => smtp.send(mail).await,
            Self::Log(log) => {
                log.record(mail);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_reset_rendering() {
        let mail = OutgoingMail::password_reset("ada@example.com", "012345", 10);
        assert_eq!(mail.to, "ada@example.com");
        assert!(mail.body.contains("012345"));
        assert!(mail.body.contains("10 minutes"));
    }

    #[tokio::test]
    async fn test_log_mailer_records_outbox() {
        let log = LogMailer::new();
        let mailer = Mailer::Log(log.clone());

        mailer
            .send(&OutgoingMail::password_reset("a@example.com", "111111", 10))
            .await
            .expect("log send never fails");

        let outbox = log.outbox();
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].to, "a@example.com");
    }

    #[tokio::test]
    async fn test_log_mailer_outbox_is_bounded() {
        let log = LogMailer::new();
        let mailer = Mailer::Log(log.clone());

        for i in 0..(OUTBOX_CAPACITY + 5) {
            let to = format!("user{}@example.com", i);
            mailer
                .send(&OutgoingMail::password_reset(&to, "000000", 10))
                .await
                .expect("log send");
        }

        let outbox = log.outbox();
        assert_eq!(outbox.len(), OUTBOX_CAPACITY);
        assert_eq!(outbox[0].to, "user5@example.com");
    }

    #[test]
    fn test_from_config_without_smtp_logs() {
        let mailer = Mailer::from_config(None).expect("mailer");
        assert!(matches!(mailer, Mailer::Log(_)));
    }

    #[tokio::test]
    async fn test_from_config_with_smtp() {
        let config = SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: "user".to_string(),
            password: "pass".to_string(),
            from: "Dashboard <no-reply@example.com>".to_string(),
        };
        let mailer = Mailer::from_config(Some(&config)).expect("mailer");
        assert!(matches!(mailer, Mailer::Smtp(_)));
    }
}
