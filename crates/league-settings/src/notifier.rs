//! Template-driven email sending

use std::sync::Arc;

use crate::mailer::{Mailer, OutgoingEmail};
use crate::store::SettingsStore;
use crate::template::{render, Placeholders};
use crate::{Result, SettingsError};

/// Renders stored templates and hands them to a [`Mailer`]
#[derive(Clone)]
pub struct EmailNotifier {
    settings: Arc<SettingsStore>,
    mailer: Arc<dyn Mailer>,
}

impl EmailNotifier {
    pub fn new(settings: Arc<SettingsStore>, mailer: Arc<dyn Mailer>) -> Self {
        Self { settings, mailer }
    }

    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.settings
    }

    /// Build the message for `key` without sending it
    pub fn compose(&self, key: &str, to: &str, values: &Placeholders) -> Result<OutgoingEmail> {
        let template = self
            .settings
            .get_email_template(key)
            .ok_or_else(|| SettingsError::TemplateNotFound(key.to_string()))?;
        Ok(OutgoingEmail {
            to: to.to_string(),
            subject: render(&template.subject, values),
            body: render(&template.body, values),
        })
    }

    pub async fn send_template(&self, key: &str, to: &str, values: &Placeholders) -> Result<()> {
        let email = self.compose(key, to, values)?;
        self.mailer.send(&email).await?;
        tracing::info!(template = key, to = %to, "notification sent");
        Ok(())
    }

    /// Send `key` to the configured admin address
    pub async fn notify_admin(&self, key: &str, values: &Placeholders) -> Result<()> {
        let to = self.settings.admin_email();
        self.send_template(key, &to, values).await
    }

    /// Send `key` to the configured supplier address
    pub async fn notify_supplier(&self, key: &str, values: &Placeholders) -> Result<()> {
        let to = self.settings.supplier_email();
        self.send_template(key, &to, values).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::MailError;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutgoingEmail>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &OutgoingEmail) -> std::result::Result<(), MailError> {
            self.sent.lock().push(email.clone());
            Ok(())
        }
    }

    fn notifier() -> (EmailNotifier, Arc<RecordingMailer>) {
        let path = std::env::temp_dir().join(format!("league-notifier-{}.json", uuid::Uuid::new_v4()));
        let mailer = Arc::new(RecordingMailer::default());
        (EmailNotifier::new(Arc::new(SettingsStore::open(path)), mailer.clone()), mailer)
    }

    #[tokio::test]
    async fn test_send_renders_subject_and_body() {
        let (notifier, mailer) = notifier();
        let values = Placeholders::new()
            .with("teamName", "Lions")
            .with("coachName", "Sam")
            .with("registrationId", "0007");
        notifier.send_template("pending", "coach@example.com", &values).await.unwrap();

        let sent = mailer.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Registration Received - Lions");
        assert!(sent[0].body.starts_with("Dear Sam,"));
        assert!(sent[0].body.contains("Registration ID: #0007"));
    }

    #[tokio::test]
    async fn test_unknown_template_not_sent() {
        let (notifier, mailer) = notifier();
        let err = notifier.send_template("nope", "a@b.example", &Placeholders::new()).await.unwrap_err();
        assert!(matches!(err, SettingsError::TemplateNotFound(_)));
        assert!(mailer.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn test_admin_gets_payout_request() {
        let (notifier, mailer) = notifier();
        let values = Placeholders::new().with("teamName", "Lions").with("amount", "263.30");
        notifier.notify_admin("payoutRequest", &values).await.unwrap();

        let sent = mailer.sent.lock();
        assert_eq!(sent[0].to, "admin@example.com");
        assert!(sent[0].body.contains("Total Amount: R263.30"));
        assert!(sent[0].body.contains("Phone: {phone}"));
    }
}
