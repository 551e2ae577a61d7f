//! Template-aware reads of stored submission data
//!
//! Intake keys data by field id, so code that knows a form only by its labels
//! or field types has to go through the template to find a value.

use serde_json::Value;

use crate::linker::submission_ref;
use crate::model::{Field, FieldType, FormTemplate};
use crate::resolver::display_value;
use crate::submission::{lookup, SubmissionData, SubmissionId};

/// Reads one submission's data through its template.
///
/// Without a template (orphaned submission) only stored keys are consulted.
#[derive(Debug, Clone, Copy)]
pub struct FieldReader<'a> {
    template: Option<&'a FormTemplate>,
    data: &'a SubmissionData,
}

impl<'a> FieldReader<'a> {
    pub fn new(template: Option<&'a FormTemplate>, data: &'a SubmissionData) -> Self {
        Self { template, data }
    }

    fn field_labelled(&self, label: &str) -> Option<&'a Field> {
        self.template?
            .fields()
            .find(|f| f.label.trim().eq_ignore_ascii_case(label))
    }

    /// Value of the field labelled `label`, or of a stored key spelled like it
    pub fn value(&self, label: &str) -> Option<&'a Value> {
        match self.field_labelled(label) {
            Some(field) => lookup(self.data, field.id, &field.label),
            None => self
                .data
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(label))
                .map(|(_, value)| value),
        }
    }

    /// First non-empty text among `labels`, tried in order
    pub fn text(&self, labels: &[&str]) -> Option<String> {
        labels
            .iter()
            .filter_map(|label| self.value(label))
            .map(trimmed)
            .find(|s| !s.is_empty())
    }

    /// First non-empty text among the template's fields of `field_type`
    pub fn text_of_type(&self, field_type: &FieldType) -> Option<String> {
        self.template?
            .fields()
            .filter(|f| &f.field_type == field_type)
            .filter_map(|f| lookup(self.data, f.id, &f.label))
            .map(trimmed)
            .find(|s| !s.is_empty())
    }

    /// Submissions picked in this form's submission dropdowns, in field order
    pub fn linked_submissions(&self) -> Vec<SubmissionId> {
        let Some(template) = self.template else {
            return Vec::new();
        };
        template
            .fields()
            .filter(|f| f.field_type == FieldType::SubmissionDropdown)
            .filter_map(|f| lookup(self.data, f.id, &f.label))
            .filter_map(submission_ref)
            .collect()
    }

    /// Copy of the data with every answered field also stored under its label
    pub fn labelled(&self) -> SubmissionData {
        let mut out = self.data.clone();
        let Some(template) = self.template else {
            return out;
        };
        for field in template.fields() {
            if field.label.is_empty() || out.contains_key(&field.label) {
                continue;
            }
            if let Some(value) = self.data.get(&field.key()) {
                out.insert(field.label.clone(), value.clone());
            }
        }
        out
    }
}

fn trimmed(value: &Value) -> String {
    display_value(value).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldDraft, TemplateDraft};
    use crate::store::TemplateStore;
    use crate::submission::{normalize_keys, SubmissionStore};
    use serde_json::json;

    fn data(value: Value) -> SubmissionData {
        value.as_object().cloned().unwrap()
    }

    fn team_form(templates: &TemplateStore) -> FormTemplate {
        let t = templates.create(TemplateDraft::new("Team Registration"));
        templates.add_field(t.id, None, FieldDraft::new(FieldType::Text, "Team Name")).unwrap();
        templates.add_field(t.id, None, FieldDraft::new(FieldType::Text, "Coach Name")).unwrap();
        templates.add_field(t.id, None, FieldDraft::new(FieldType::Email, "Contact")).unwrap();
        templates.get(t.id).unwrap()
    }

    #[test]
    fn test_reads_by_label_after_intake() {
        let templates = TemplateStore::new();
        let t = team_form(&templates);
        let stored = normalize_keys(&t, data(json!({"Team Name": " Lions ", "Coach Name": "Sam", "Contact": "c@lions.example"})));
        assert!(stored.get("Team Name").is_none());

        let reader = FieldReader::new(Some(&t), &stored);
        assert_eq!(reader.text(&["team name"]).as_deref(), Some("Lions"));
        assert_eq!(reader.text(&["Manager Name", "Coach Name"]).as_deref(), Some("Sam"));
        assert_eq!(reader.text(&["Team Email"]), None);
        assert_eq!(reader.text_of_type(&FieldType::Email).as_deref(), Some("c@lions.example"));
    }

    #[test]
    fn test_orphaned_data_reads_stored_keys() {
        let stored = data(json!({"email": "x@example.com", "100": "Lions"}));
        let reader = FieldReader::new(None, &stored);
        assert_eq!(reader.text(&["Email"]).as_deref(), Some("x@example.com"));
        assert_eq!(reader.text(&["Team Name"]), None);
        assert!(reader.linked_submissions().is_empty());
        assert_eq!(reader.labelled(), stored);
    }

    #[test]
    fn test_labelled_keeps_ids_and_extras() {
        let templates = TemplateStore::new();
        let t = team_form(&templates);
        let stored = normalize_keys(&t, data(json!({"Team Name": "Lions", "referral": "school"})));

        let labelled = FieldReader::new(Some(&t), &stored).labelled();
        assert_eq!(labelled["100"], "Lions");
        assert_eq!(labelled["Team Name"], "Lions");
        assert_eq!(labelled["referral"], "school");
        assert!(labelled.get("Coach Name").is_none());
    }

    #[test]
    fn test_linked_submissions_from_dropdowns() {
        let templates = TemplateStore::new();
        let submissions = SubmissionStore::new();
        let team = team_form(&templates);
        let picked = submissions.insert(&team, data(json!({"Team Name": "Lions"})));

        let player = templates.create(TemplateDraft::new("Player Registration"));
        templates.add_field(player.id, None, FieldDraft::new(FieldType::Text, "Player Name")).unwrap();
        let mut dropdown = FieldDraft::new(FieldType::SubmissionDropdown, "Main Team");
        dropdown.source_form_id = Some(team.id);
        dropdown.display_field_id = Some(100);
        templates.add_field(player.id, None, dropdown).unwrap();
        let player = templates.get(player.id).unwrap();

        let stored = normalize_keys(&player, data(json!({"Player Name": "Jo", "Main Team": picked.id.to_string()})));
        let reader = FieldReader::new(Some(&player), &stored);
        assert_eq!(reader.linked_submissions(), vec![picked.id]);
    }
}
