//! Submission service
//!
//! Commit-then-notify: a status change is stored before the notifier runs,
//! and a notifier failure is reported alongside the result instead of undoing it.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::export::{export_csv, CsvExport};
use crate::linker::{self, DropdownOption, PrefillValue};
use crate::model::{FieldId, TemplateId};
use crate::records::StoreRecords;
use crate::resolver::{self, ResolvedEntry};
use crate::store::TemplateStore;
use crate::submission::{
    normalize_keys, ApprovalStatus, ReviewStatus, Submission, SubmissionData, SubmissionFilter, SubmissionId,
    SubmissionStore,
};
use crate::{FormsError, Result};

/// Notification failure
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("no email template for '{0}'")]
    MissingTemplate(String),

    #[error("submission {0} has no recipient address")]
    NoRecipient(SubmissionId),

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("mail disabled")]
    Disabled,
}

/// Outbound port told about approval changes
#[async_trait]
pub trait SubmissionNotifier: Send + Sync {
    async fn approval_changed(&self, submission: &Submission) -> std::result::Result<(), NotifyError>;
}

/// Notifier in place while outbound mail is switched off; every change is a skip
pub struct DisabledNotifier;

#[async_trait]
impl SubmissionNotifier for DisabledNotifier {
    async fn approval_changed(&self, _submission: &Submission) -> std::result::Result<(), NotifyError> {
        Err(NotifyError::Disabled)
    }
}

/// What happened to the notification after a committed change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum NotificationOutcome {
    Sent,
    Skipped(String),
    Failed(String),
}

pub struct SubmissionService {
    templates: Arc<TemplateStore>,
    submissions: Arc<SubmissionStore>,
    notifier: Arc<dyn SubmissionNotifier>,
}

impl SubmissionService {
    pub fn new(
        templates: Arc<TemplateStore>,
        submissions: Arc<SubmissionStore>,
        notifier: Arc<dyn SubmissionNotifier>,
    ) -> Self {
        Self {
            templates,
            submissions,
            notifier,
        }
    }

    pub fn templates(&self) -> &Arc<TemplateStore> {
        &self.templates
    }

    pub fn submissions(&self) -> &Arc<SubmissionStore> {
        &self.submissions
    }

    pub fn records(&self) -> StoreRecords<'_> {
        StoreRecords::new(&self.templates, &self.submissions)
    }

    /// Intake: label keys are rewritten to field ids
    pub fn submit(&self, form_id: TemplateId, data: SubmissionData) -> Result<Submission> {
        let template = self
            .templates
            .get(form_id)
            .ok_or(FormsError::TemplateNotFound(form_id))?;
        Ok(self.submissions.insert(&template, data))
    }

    pub fn get(&self, id: SubmissionId) -> Option<Submission> {
        self.submissions.get(id)
    }

    pub fn list(&self, filter: &SubmissionFilter) -> Vec<Submission> {
        self.submissions.list(filter)
    }

    pub fn update_status(&self, id: SubmissionId, status: ReviewStatus) -> Result<Submission> {
        let submission = self.submissions.update_status(id, status)?;
        tracing::info!(submission_id = id, status = %status, "submission status updated");
        Ok(submission)
    }

    /// Store the new approval status, then notify the submitter
    pub async fn update_approval_status(
        &self,
        id: SubmissionId,
        status: ApprovalStatus,
    ) -> Result<(Submission, NotificationOutcome)> {
        let submission = self.submissions.update_approval_status(id, status)?;
        tracing::info!(submission_id = id, approval_status = %status, "approval status updated");

        let outcome = match self.notifier.approval_changed(&submission).await {
            Ok(()) => NotificationOutcome::Sent,
            Err(e @ (NotifyError::MissingTemplate(_) | NotifyError::NoRecipient(_) | NotifyError::Disabled)) => {
                tracing::warn!(submission_id = id, "approval email skipped: {}", e);
                NotificationOutcome::Skipped(e.to_string())
            }
            Err(e) => {
                tracing::warn!(submission_id = id, "approval email failed: {}", e);
                NotificationOutcome::Failed(e.to_string())
            }
        };
        Ok((submission, outcome))
    }

    /// Replace the data map, normalizing keys while the template still exists
    pub fn update_data(&self, id: SubmissionId, data: SubmissionData) -> Result<Submission> {
        let existing = self.submissions.get(id).ok_or(FormsError::SubmissionNotFound(id))?;
        let data = match self.templates.get(existing.form_id) {
            Some(template) => normalize_keys(&template, data),
            None => data,
        };
        self.submissions.update_data(id, data)
    }

    pub fn delete(&self, id: SubmissionId) -> bool {
        self.submissions.delete(id)
    }

    /// Viewer rows for one submission
    pub fn resolve(&self, id: SubmissionId) -> Result<Vec<ResolvedEntry>> {
        let submission = self.submissions.get(id).ok_or(FormsError::SubmissionNotFound(id))?;
        let template = self.templates.get(submission.form_id);
        Ok(resolver::resolve(template.as_ref(), &submission, &self.records()))
    }

    /// CSV of every submission, or of one form's submissions
    pub fn export(&self, form_id: Option<TemplateId>) -> Result<CsvExport> {
        let filter = match form_id {
            Some(id) => Some(self.templates.get(id).ok_or(FormsError::TemplateNotFound(id))?),
            None => None,
        };
        let rows = self.submissions.list(&SubmissionFilter { form_id });
        Ok(export_csv(&rows, filter.as_ref(), &self.records()))
    }

    pub fn dropdown_options(&self, form_id: TemplateId, field_id: FieldId) -> Result<Vec<DropdownOption>> {
        let template = self
            .templates
            .get(form_id)
            .ok_or(FormsError::TemplateNotFound(form_id))?;
        let field = template.field(field_id).ok_or(FormsError::FieldNotFound(field_id))?;
        linker::dropdown_options(field, &self.records())
    }

    pub fn prefill(&self, form_id: TemplateId, field_id: FieldId, selected: SubmissionId) -> Result<Vec<PrefillValue>> {
        let template = self
            .templates
            .get(form_id)
            .ok_or(FormsError::TemplateNotFound(form_id))?;
        let field = template.field(field_id).ok_or(FormsError::FieldNotFound(field_id))?;
        linker::prefill(field, selected, &self.records())
    }

    /// Value an autofill field takes for in-progress form `data`
    pub fn autofill(&self, form_id: TemplateId, field_id: FieldId, data: &SubmissionData) -> Result<Option<serde_json::Value>> {
        let template = self
            .templates
            .get(form_id)
            .ok_or(FormsError::TemplateNotFound(form_id))?;
        let field = template.field(field_id).ok_or(FormsError::FieldNotFound(field_id))?;
        Ok(linker::autofill_value(&template, field, data, &self.records()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldDraft, FieldType, TemplateDraft};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyNotifier {
        calls: AtomicUsize,
        error: fn() -> NotifyError,
    }

    #[async_trait]
    impl SubmissionNotifier for FlakyNotifier {
        async fn approval_changed(&self, _submission: &Submission) -> std::result::Result<(), NotifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err((self.error)())
        }
    }

    fn service(notifier: Arc<dyn SubmissionNotifier>) -> (SubmissionService, TemplateId) {
        let templates = Arc::new(TemplateStore::new());
        let t = templates.create(TemplateDraft::new("Team Registration"));
        templates.add_field(t.id, None, FieldDraft::new(FieldType::Text, "Team Name")).unwrap();
        (SubmissionService::new(templates, Arc::new(SubmissionStore::new()), notifier), t.id)
    }

    fn data(value: serde_json::Value) -> SubmissionData {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_approval_commits_when_delivery_fails() {
        let notifier = Arc::new(FlakyNotifier {
            calls: AtomicUsize::new(0),
            error: || NotifyError::Delivery("connection refused".into()),
        });
        let (svc, form_id) = service(notifier.clone());
        let s = svc.submit(form_id, data(json!({"Team Name": "Lions"}))).unwrap();

        let (updated, outcome) = svc.update_approval_status(s.id, ApprovalStatus::Complete).await.unwrap();
        assert_eq!(updated.approval_status, ApprovalStatus::Complete);
        assert!(matches!(outcome, NotificationOutcome::Failed(_)));
        assert_eq!(svc.get(s.id).unwrap().approval_status, ApprovalStatus::Complete);
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_approval_commits_without_template() {
        let notifier = Arc::new(FlakyNotifier {
            calls: AtomicUsize::new(0),
            error: || NotifyError::MissingTemplate("reviewed".into()),
        });
        let (svc, form_id) = service(notifier);
        let s = svc.submit(form_id, SubmissionData::new()).unwrap();

        let (updated, outcome) = svc.update_approval_status(s.id, ApprovalStatus::Reviewed).await.unwrap();
        assert_eq!(updated.approval_status, ApprovalStatus::Reviewed);
        assert_eq!(outcome, NotificationOutcome::Skipped("no email template for 'reviewed'".into()));
    }

    #[tokio::test]
    async fn test_approval_skipped_when_mail_disabled() {
        let (svc, form_id) = service(Arc::new(DisabledNotifier));
        let s = svc.submit(form_id, data(json!({"Team Name": "Lions"}))).unwrap();

        let (updated, outcome) = svc.update_approval_status(s.id, ApprovalStatus::Complete).await.unwrap();
        assert_eq!(updated.approval_status, ApprovalStatus::Complete);
        assert_eq!(outcome, NotificationOutcome::Skipped("mail disabled".into()));
    }

    #[tokio::test]
    async fn test_approval_unknown_submission() {
        let (svc, _) = service(Arc::new(DisabledNotifier));
        let err = svc.update_approval_status(7, ApprovalStatus::Complete).await.unwrap_err();
        assert!(matches!(err, FormsError::SubmissionNotFound(7)));
    }

    #[test]
    fn test_submit_unknown_form() {
        let (svc, _) = service(Arc::new(DisabledNotifier));
        assert!(matches!(svc.submit(99, SubmissionData::new()), Err(FormsError::TemplateNotFound(99))));
    }

    #[test]
    fn test_update_data_normalizes() {
        let (svc, form_id) = service(Arc::new(DisabledNotifier));
        let s = svc.submit(form_id, SubmissionData::new()).unwrap();
        let s = svc.update_data(s.id, data(json!({"Team Name": "Tigers"}))).unwrap();
        assert_eq!(s.data["100"], "Tigers");

        let entries = svc.resolve(s.id).unwrap();
        assert_eq!(entries[0].value, "Tigers");
    }

    #[test]
    fn test_orphaned_submission_survives_template_delete() {
        let (svc, form_id) = service(Arc::new(DisabledNotifier));
        let s = svc.submit(form_id, data(json!({"Team Name": "Lions"}))).unwrap();
        assert!(svc.templates().delete(form_id));

        let entries = svc.resolve(s.id).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].from_form);
        assert_eq!(entries[0].label, "100");

        let export = svc.export(None).unwrap();
        assert_eq!(export.content.lines().count(), 2);
        assert!(matches!(svc.export(Some(form_id)), Err(FormsError::TemplateNotFound(_))));
    }
}
