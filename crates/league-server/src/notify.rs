//! Email notifications for workflow events
//!
//! Adapts the settings crate's [`EmailNotifier`] to the forms crate's
//! [`SubmissionNotifier`] port, and sends the admin alert for payout requests
//! and the emails for product orders.

use async_trait::async_trait;
use league_common::format_currency;
use league_forms::{
    FieldReader, FieldType, NotificationOutcome, NotifyError, Submission, SubmissionNotifier, TemplateStore,
};
use league_settings::{EmailNotifier, Placeholders, SettingsError};
use league_orders::Order;
use league_teams::PayoutRequest;
use std::sync::Arc;

use crate::models::OrderEmails;

/// Registration form labels read for approval emails, matched case-insensitively
const TEAM_NAME_LABELS: &[&str] = &["Team Name"];
const COACH_NAME_LABELS: &[&str] = &["Coach Name", "Manager Name", "Coach"];
const RECIPIENT_LABELS: &[&str] = &["Team Email", "Coach Email", "Email"];

/// Sends the approval-status email matching the new status to the submitter.
///
/// The recipient is the first labelled email field with an address, else the
/// first `email` field of the form.
pub struct ApprovalEmails {
    email: EmailNotifier,
    templates: Arc<TemplateStore>,
    base_url: String,
}

impl ApprovalEmails {
    pub fn new(email: EmailNotifier, templates: Arc<TemplateStore>, base_url: impl Into<String>) -> Self {
        Self {
            email,
            templates,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl SubmissionNotifier for ApprovalEmails {
    async fn approval_changed(&self, submission: &Submission) -> Result<(), NotifyError> {
        let template = self.templates.get(submission.form_id);
        let reader = FieldReader::new(template.as_ref(), &submission.data);
        let to = reader
            .text(RECIPIENT_LABELS)
            .filter(|v| v.contains('@'))
            .or_else(|| reader.text_of_type(&FieldType::Email))
            .filter(|v| v.contains('@'))
            .ok_or(NotifyError::NoRecipient(submission.id))?;

        let values = Placeholders::new()
            .with("teamName", reader.text(TEAM_NAME_LABELS).unwrap_or_default())
            .with("coachName", reader.text(COACH_NAME_LABELS).unwrap_or_default())
            .with("registrationId", registration_id(submission.id))
            .with("email", to.clone())
            .with("loginUrl", format!("{}/team-portal/login", self.base_url.trim_end_matches('/')));

        let key = submission.approval_status.template_key();
        self.email
            .send_template(key, &to, &values)
            .await
            .map_err(|e| match e {
                SettingsError::TemplateNotFound(key) => NotifyError::MissingTemplate(key),
                other => NotifyError::Delivery(other.to_string()),
            })
    }
}

/// Alert the admin about a new payout request
pub async fn payout_requested(email: &EmailNotifier, request: &PayoutRequest, base_url: &str) -> NotificationOutcome {
    let values = Placeholders::new()
        .with("teamName", request.team_name.clone())
        .with("coachName", request.manager_name.clone())
        .with("email", request.email.clone())
        .with("phone", request.phone.clone())
        .with("requestId", request.id.to_string())
        .with("amount", format_currency(request.amount))
        .with("markup", format_currency(request.breakdown.markup))
        .with("commission", format_currency(request.breakdown.commission))
        .with("requestDate", request.requested_at.format("%Y-%m-%d %H:%M").to_string())
        .with("adminLink", base_url.trim_end_matches('/'));

    let sent = email.notify_admin("payoutRequest", &values).await;
    delivery_outcome(sent, "payoutRequest", request.id)
}

/// Confirm a product order to the customer and forward it to the supplier.
/// Each send is reported on its own; one failing does not stop the other.
pub async fn order_placed(email: &EmailNotifier, order: &Order) -> OrderEmails {
    let phone = if order.customer_phone.is_empty() { "N/A" } else { order.customer_phone.as_str() };
    let values = Placeholders::new()
        .with("orderNumber", order.order_number.clone())
        .with("orderDate", order.created_at.format("%Y-%m-%d").to_string())
        .with("totalAmount", format_currency(order.total))
        .with("orderItems", order.items_text())
        .with("shippingAddress", order.shipping_address.to_string())
        .with("customerName", order.customer_name.clone())
        .with("customerEmail", order.customer_email.clone())
        .with("customerPhone", phone);

    let confirmed = email
        .send_template("orderConfirmation", &order.customer_email, &values)
        .await;
    let forwarded = email.notify_supplier("supplierForward", &values).await;
    OrderEmails {
        customer: delivery_outcome(confirmed, "orderConfirmation", order.id),
        supplier: delivery_outcome(forwarded, "supplierForward", order.id),
    }
}

fn delivery_outcome(result: Result<(), SettingsError>, template: &str, record_id: u64) -> NotificationOutcome {
    match result {
        Ok(()) => NotificationOutcome::Sent,
        Err(e @ SettingsError::TemplateNotFound(_)) => {
            tracing::warn!(template, record_id, "email skipped: {}", e);
            NotificationOutcome::Skipped(e.to_string())
        }
        Err(e) => {
            tracing::warn!(template, record_id, "email failed: {}", e);
            NotificationOutcome::Failed(e.to_string())
        }
    }
}

/// Last four digits of the zero-padded submission id
fn registration_id(id: u64) -> String {
    let padded = format!("{:04}", id);
    padded[padded.len() - 4..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use league_forms::{ApprovalStatus, FieldDraft, SubmissionStore, TemplateDraft};
    use league_orders::{OrderBook, OrderDraft, OrderItem};
    use league_settings::{LogMailer, MailError, Mailer, OutgoingEmail, SettingsStore};
    use league_teams::{TeamDraft, TeamRegistry};
    use parking_lot::Mutex;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutgoingEmail>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
            self.sent.lock().push(email.clone());
            Ok(())
        }
    }

    struct RejectingMailer;

    #[async_trait]
    impl Mailer for RejectingMailer {
        async fn send(&self, _email: &OutgoingEmail) -> Result<(), MailError> {
            Err(MailError::Transport("relay refused".into()))
        }
    }

    fn email(mailer: Arc<dyn Mailer>) -> EmailNotifier {
        let path = std::env::temp_dir().join(format!("league-notify-{}.json", uuid::Uuid::new_v4()));
        EmailNotifier::new(Arc::new(SettingsStore::open(path)), mailer)
    }

    fn pending_request() -> PayoutRequest {
        let teams = TeamRegistry::new();
        let draft = TeamDraft {
            team_name: "Lions".into(),
            email: "lions@example.com".into(),
            ..Default::default()
        };
        let team = teams.create(draft).unwrap().team;
        teams.add_product_commission(team.id, "Jo", dec!(633.00), "1001").unwrap();
        teams.create_payout_request(team.id).unwrap()
    }

    /// Registration form whose fields carry the labels approval emails read
    fn registration(templates: &TemplateStore, email_label: &str) -> Submission {
        let form = templates.create(TemplateDraft::new("Team Registration"));
        templates.add_field(form.id, None, FieldDraft::new(FieldType::Text, "Team Name")).unwrap();
        templates.add_field(form.id, None, FieldDraft::new(FieldType::Text, "Coach Name")).unwrap();
        templates.add_field(form.id, None, FieldDraft::new(FieldType::Email, email_label)).unwrap();
        let data = json!({"Team Name": "Lions", "Coach Name": "Sam", email_label: "coach@lions.example"});
        let mut submission =
            SubmissionStore::new().insert(&templates.get(form.id).unwrap(), data.as_object().cloned().unwrap());
        submission.approval_status = ApprovalStatus::Complete;
        submission
    }

    #[tokio::test]
    async fn test_approval_email_reads_form_labels() {
        let mailer = Arc::new(RecordingMailer::default());
        let templates = Arc::new(TemplateStore::new());
        let submission = registration(&templates, "Team Email");
        assert!(submission.data.get("Team Email").is_none());

        let emails = ApprovalEmails::new(email(mailer.clone()), templates, "http://localhost:3000");
        emails.approval_changed(&submission).await.unwrap();

        let sent = mailer.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "coach@lions.example");
        assert_eq!(sent[0].subject, "Registration Approved - Lions");
        assert!(sent[0].body.starts_with("Dear Sam,"));
        assert!(sent[0].body.contains("http://localhost:3000/team-portal/login"));
    }

    #[tokio::test]
    async fn test_approval_email_falls_back_to_email_field() {
        let mailer = Arc::new(RecordingMailer::default());
        let templates = Arc::new(TemplateStore::new());
        let submission = registration(&templates, "Contact Address");

        let emails = ApprovalEmails::new(email(mailer.clone()), templates, "http://localhost:3000");
        emails.approval_changed(&submission).await.unwrap();
        assert_eq!(mailer.sent.lock()[0].to, "coach@lions.example");
    }

    #[tokio::test]
    async fn test_approval_email_without_address() {
        let templates = Arc::new(TemplateStore::new());
        let form = templates.create(TemplateDraft::new("Team Registration"));
        templates.add_field(form.id, None, FieldDraft::new(FieldType::Text, "Team Name")).unwrap();
        let data = json!({"Team Name": "Lions"});
        let submission =
            SubmissionStore::new().insert(&templates.get(form.id).unwrap(), data.as_object().cloned().unwrap());

        let emails = ApprovalEmails::new(email(Arc::new(RecordingMailer::default())), templates, "");
        let err = emails.approval_changed(&submission).await.unwrap_err();
        assert!(matches!(err, NotifyError::NoRecipient(id) if id == submission.id));
    }

    #[test]
    fn test_registration_id() {
        assert_eq!(registration_id(7), "0007");
        assert_eq!(registration_id(12345), "2345");
    }

    #[test]
    fn test_payout_email_sent() {
        let email = email(Arc::new(LogMailer::new("League", "noreply@league.example")));
        let outcome = tokio_test::block_on(payout_requested(&email, &pending_request(), "http://localhost:3000/"));
        assert_eq!(outcome, NotificationOutcome::Sent);
    }

    #[test]
    fn test_payout_email_failure_is_reported() {
        let email = email(Arc::new(RejectingMailer));
        let outcome = tokio_test::block_on(payout_requested(&email, &pending_request(), "http://localhost:3000"));
        assert!(matches!(outcome, NotificationOutcome::Failed(reason) if reason.contains("relay refused")));
    }

    #[tokio::test]
    async fn test_order_emails_reach_customer_and_supplier() {
        let mailer = Arc::new(RecordingMailer::default());
        let order = OrderBook::new()
            .create(OrderDraft {
                customer_name: "John Doe".into(),
                customer_email: "john@example.com".into(),
                items: vec![OrderItem { name: "Training Kit".into(), quantity: 1, price: dec!(899), size: None }],
                shipping: dec!(100),
                ..Default::default()
            })
            .unwrap();

        let outcome = order_placed(&email(mailer.clone()), &order).await;
        assert_eq!(outcome.customer, NotificationOutcome::Sent);
        assert_eq!(outcome.supplier, NotificationOutcome::Sent);

        let sent = mailer.sent.lock();
        assert_eq!(sent[0].to, "john@example.com");
        assert_eq!(sent[0].subject, format!("Order Confirmation - #{}", order.order_number));
        assert!(sent[0].body.contains("Total Amount: R999.00"));
        assert!(sent[0].body.contains("- Training Kit x1 - R899.00"));
        assert_eq!(sent[1].to, "supplier@example.com");
        assert!(sent[1].body.contains("Phone: N/A"));
    }
}
