//! Outbound mail port

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid recipient address: {0}")]
    InvalidAddress(String),

    #[error("mail transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Sends rendered emails
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// Development mailer: logs each message instead of delivering it
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from_name: &str, from_email: &str) -> Self {
        Self {
            from: format!("{} <{}>", from_name, from_email),
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        if !email.to.contains('@') {
            return Err(MailError::InvalidAddress(email.to.clone()));
        }
        tracing::info!(
            from = %self.from,
            to = %email.to,
            subject = %email.subject,
            "email (log mailer, not delivered)"
        );
        tracing::debug!(body = %email.body, "email body");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_mailer_checks_address() {
        let mailer = LogMailer::new("League", "noreply@league.example");
        let ok = OutgoingEmail { to: "coach@example.com".into(), subject: "Hi".into(), body: String::new() };
        assert!(mailer.send(&ok).await.is_ok());

        let bad = OutgoingEmail { to: "nobody".into(), ..ok };
        assert!(matches!(mailer.send(&bad).await, Err(MailError::InvalidAddress(_))));
    }
}
