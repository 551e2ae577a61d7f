//! Submissions and their two independent status lifecycles

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use crate::model::{FieldId, FormTemplate, TemplateId};
use crate::{FormsError, Result};

pub type SubmissionId = u64;

/// Submitted values keyed by field id (or a synthetic `{id}_part` key)
pub type SubmissionData = serde_json::Map<String, serde_json::Value>;

/// Internal workflow tracking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Reviewed,
    Completed,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reviewed => "reviewed",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Admin review outcome. Each value selects the email template sent to the submitter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Reviewed,
    Complete,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reviewed => "reviewed",
            Self::Complete => "complete",
        }
    }

    /// Key of the email template announcing this status
    pub fn template_key(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: SubmissionId,
    pub form_id: TemplateId,
    pub form_name: String,
    pub data: SubmissionData,
    pub status: ReviewStatus,
    pub approval_status: ApprovalStatus,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    /// Value of a field: canonical id key first, then the legacy label key
    pub fn value_for(&self, field_id: FieldId, label: &str) -> Option<&serde_json::Value> {
        lookup(&self.data, field_id, label)
    }
}

/// Id-keyed lookup with the legacy label fallback
pub(crate) fn lookup<'a>(data: &'a SubmissionData, field_id: FieldId, label: &str) -> Option<&'a serde_json::Value> {
    data.get(&field_id.to_string()).or_else(|| data.get(label))
}

/// Rewrite label keys to field-id keys, keeping insertion order.
///
/// When both a label key and its id key are present the id key wins. Keys
/// that match no field are kept as they are.
pub fn normalize_keys(template: &FormTemplate, data: SubmissionData) -> SubmissionData {
    let mut by_label: HashMap<&str, FieldId> = HashMap::new();
    for field in template.fields() {
        by_label.entry(field.label.as_str()).or_insert(field.id);
    }
    let present: HashSet<String> = data.keys().cloned().collect();

    let mut out = SubmissionData::new();
    for (key, value) in data {
        match by_label.get(key.as_str()) {
            Some(id) if !present.contains(&id.to_string()) => {
                out.insert(id.to_string(), value);
            }
            Some(_) => {}
            None => {
                out.insert(key, value);
            }
        }
    }
    out
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionFilter {
    #[serde(default)]
    pub form_id: Option<TemplateId>,
}

struct SubmissionState {
    submissions: BTreeMap<SubmissionId, Submission>,
    next_id: SubmissionId,
}

/// In-memory submission store
pub struct SubmissionStore {
    state: RwLock<SubmissionState>,
}

impl SubmissionStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(SubmissionState {
                submissions: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Record a submission against `template`; both statuses start pending
    pub fn insert(&self, template: &FormTemplate, data: SubmissionData) -> Submission {
        let data = normalize_keys(template, data);
        let mut state = self.state.write();
        let id = state.next_id;
        state.next_id += 1;

        let now = Utc::now();
        let submission = Submission {
            id,
            form_id: template.id,
            form_name: template.name.clone(),
            data,
            status: ReviewStatus::Pending,
            approval_status: ApprovalStatus::Pending,
            submitted_at: now,
            updated_at: now,
        };
        state.submissions.insert(id, submission.clone());
        tracing::info!(submission_id = id, form_id = template.id, "submission received");
        submission
    }

    pub fn get(&self, id: SubmissionId) -> Option<Submission> {
        self.state.read().submissions.get(&id).cloned()
    }

    /// Newest first, optionally restricted to one form
    pub fn list(&self, filter: &SubmissionFilter) -> Vec<Submission> {
        let state = self.state.read();
        let mut out: Vec<Submission> = state
            .submissions
            .values()
            .filter(|s| filter.form_id.map_or(true, |form_id| s.form_id == form_id))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at).then(b.id.cmp(&a.id)));
        out
    }

    pub fn for_form(&self, form_id: TemplateId) -> Vec<Submission> {
        self.list(&SubmissionFilter { form_id: Some(form_id) })
    }

    pub fn update_status(&self, id: SubmissionId, status: ReviewStatus) -> Result<Submission> {
        self.mutate(id, |s| s.status = status)
    }

    pub fn update_approval_status(&self, id: SubmissionId, status: ApprovalStatus) -> Result<Submission> {
        self.mutate(id, |s| s.approval_status = status)
    }

    /// Replace the whole data map
    pub fn update_data(&self, id: SubmissionId, data: SubmissionData) -> Result<Submission> {
        self.mutate(id, |s| s.data = data)
    }

    /// Hard removal
    pub fn delete(&self, id: SubmissionId) -> bool {
        let removed = self.state.write().submissions.remove(&id).is_some();
        if removed {
            tracing::info!(submission_id = id, "submission deleted");
        }
        removed
    }

    pub fn count(&self) -> usize {
        self.state.read().submissions.len()
    }

    fn mutate(&self, id: SubmissionId, f: impl FnOnce(&mut Submission)) -> Result<Submission> {
        let mut state = self.state.write();
        let submission = state
            .submissions
            .get_mut(&id)
            .ok_or(FormsError::SubmissionNotFound(id))?;
        f(submission);
        submission.updated_at = Utc::now();
        Ok(submission.clone())
    }
}

impl Default for SubmissionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldDraft, FieldType, TemplateDraft};
    use crate::store::TemplateStore;
    use serde_json::json;

    fn team_template() -> FormTemplate {
        let store = TemplateStore::new();
        let t = store.create(TemplateDraft::new("Team Registration"));
        store.add_field(t.id, None, FieldDraft::new(FieldType::Text, "Team Name")).unwrap();
        store.add_field(t.id, None, FieldDraft::new(FieldType::Email, "Team Email")).unwrap();
        store.get(t.id).unwrap()
    }

    fn data(value: serde_json::Value) -> SubmissionData {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_normalize_label_keys() {
        let t = team_template();
        let raw = data(json!({"Team Name": "Lions", "101": "lions@example.com", "Team Email": "old@example.com", "notes": "x"}));
        let normalized = normalize_keys(&t, raw);

        let keys: Vec<&str> = normalized.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["100", "101", "notes"]);
        assert_eq!(normalized["100"], "Lions");
        assert_eq!(normalized["101"], "lions@example.com");
    }

    #[test]
    fn test_insert_and_statuses() {
        let t = team_template();
        let store = SubmissionStore::new();
        let s = store.insert(&t, data(json!({"Team Name": "Lions"})));
        assert_eq!(s.form_name, "Team Registration");
        assert_eq!(s.status, ReviewStatus::Pending);
        assert_eq!(s.approval_status, ApprovalStatus::Pending);
        assert_eq!(s.value_for(100, "Team Name"), Some(&json!("Lions")));

        let s = store.update_status(s.id, ReviewStatus::Completed).unwrap();
        assert_eq!(s.status, ReviewStatus::Completed);
        assert_eq!(s.approval_status, ApprovalStatus::Pending);

        let s = store.update_approval_status(s.id, ApprovalStatus::Complete).unwrap();
        assert_eq!(s.approval_status, ApprovalStatus::Complete);
        assert_eq!(serde_json::to_value(&s).unwrap()["approvalStatus"], "complete");
    }

    #[test]
    fn test_list_newest_first_and_filter() {
        let t = team_template();
        let store = SubmissionStore::new();
        let a = store.insert(&t, SubmissionData::new());
        let b = store.insert(&t, SubmissionData::new());

        let ids: Vec<SubmissionId> = store.list(&SubmissionFilter::default()).iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
        assert!(store.for_form(999).is_empty());
    }

    #[test]
    fn test_missing_submission() {
        let store = SubmissionStore::new();
        assert!(matches!(
            store.update_status(42, ReviewStatus::Reviewed),
            Err(FormsError::SubmissionNotFound(42))
        ));
        assert!(!store.delete(42));
    }

    #[test]
    fn test_legacy_label_lookup() {
        let legacy = data(json!({"Team Name": "Lions"}));
        assert_eq!(lookup(&legacy, 100, "Team Name"), Some(&json!("Lions")));
        let both = data(json!({"Team Name": "Old", "100": "New"}));
        assert_eq!(lookup(&both, 100, "Team Name"), Some(&json!("New")));
    }
}
