//! Read access to templates and submissions for cross-record joins

use crate::model::{FormTemplate, TemplateId};
use crate::store::TemplateStore;
use crate::submission::{Submission, SubmissionId, SubmissionStore};

/// Lookups the resolver, exporter and linker need to follow dropdown links
pub trait RecordSource {
    fn template(&self, id: TemplateId) -> Option<FormTemplate>;

    fn submission(&self, id: SubmissionId) -> Option<Submission>;

    /// Submissions of one form, newest first
    fn submissions_for(&self, form_id: TemplateId) -> Vec<Submission>;
}

/// [`RecordSource`] over the live stores
pub struct StoreRecords<'a> {
    pub templates: &'a TemplateStore,
    pub submissions: &'a SubmissionStore,
}

impl<'a> StoreRecords<'a> {
    pub fn new(templates: &'a TemplateStore, submissions: &'a SubmissionStore) -> Self {
        Self { templates, submissions }
    }
}

impl RecordSource for StoreRecords<'_> {
    fn template(&self, id: TemplateId) -> Option<FormTemplate> {
        self.templates.get(id)
    }

    fn submission(&self, id: SubmissionId) -> Option<Submission> {
        self.submissions.get(id)
    }

    fn submissions_for(&self, form_id: TemplateId) -> Vec<Submission> {
        self.submissions.for_form(form_id)
    }
}
