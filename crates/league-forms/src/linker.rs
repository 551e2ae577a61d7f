//! Prefill and autofill joins between templates
//!
//! Prefill lives on the submission dropdown itself and shows fields of the
//! picked submission read-only. Autofill lives on another field of the same
//! template and copies one source field through the dropdown's selection.

use serde::Serialize;
use serde_json::Value;

use crate::model::{AutofillLink, Field, FieldId, FieldType, FormTemplate, TemplateId};
use crate::records::RecordSource;
use crate::resolver::display_value;
use crate::submission::{lookup, Submission, SubmissionData, SubmissionId};
use crate::{FormsError, Result};

/// Choice offered by a submission dropdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DropdownOption {
    pub submission_id: SubmissionId,
    pub label: String,
}

/// Read-only value copied from the picked submission
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefillValue {
    pub source_field_id: FieldId,
    pub label: String,
    pub value: Option<Value>,
}

/// Id stored by a submission dropdown: a number or numeric string
pub(crate) fn submission_ref(raw: &Value) -> Option<SubmissionId> {
    match raw {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Submission referenced by a stored dropdown value
pub(crate) fn selected_submission(raw: &Value, records: &dyn RecordSource) -> Option<Submission> {
    records.submission(submission_ref(raw)?)
}

/// Value of `field_id` in a linked submission, with the legacy label fallback
/// taken from `fallback_label` or the source template
pub(crate) fn source_value<'a>(
    source: Option<&FormTemplate>,
    submission: &'a Submission,
    field_id: FieldId,
    fallback_label: Option<&str>,
) -> Option<&'a Value> {
    let label = match fallback_label {
        Some(label) => label.to_string(),
        None => source
            .and_then(|t| t.field(field_id))
            .map(|f| f.label.clone())
            .unwrap_or_default(),
    };
    lookup(&submission.data, field_id, &label)
}

fn dropdown_config(field: &Field) -> Result<(TemplateId, FieldId)> {
    if field.field_type != FieldType::SubmissionDropdown {
        return Err(FormsError::Validation(format!("field '{}' is not a submission dropdown", field.label)));
    }
    match (field.source_form_id, field.display_field_id) {
        (Some(source), Some(display)) => Ok((source, display)),
        _ => Err(FormsError::Validation(format!(
            "dropdown '{}' needs a source form and a display field",
            field.label
        ))),
    }
}

/// Options for a submission dropdown: the source form's submissions labeled
/// by their display field
pub fn dropdown_options(field: &Field, records: &dyn RecordSource) -> Result<Vec<DropdownOption>> {
    let (source_id, display_id) = dropdown_config(field)?;
    let source = records.template(source_id);

    Ok(records
        .submissions_for(source_id)
        .iter()
        .map(|s| DropdownOption {
            submission_id: s.id,
            label: source_value(source.as_ref(), s, display_id, None)
                .map(display_value)
                .unwrap_or_default(),
        })
        .collect())
}

/// Prefill values for a dropdown once `selected` is picked
pub fn prefill(field: &Field, selected: SubmissionId, records: &dyn RecordSource) -> Result<Vec<PrefillValue>> {
    let (source_id, _) = dropdown_config(field)?;
    let submission = records
        .submission(selected)
        .filter(|s| s.form_id == source_id)
        .ok_or(FormsError::SubmissionNotFound(selected))?;
    let source = records.template(source_id);

    Ok(field
        .prefill_fields
        .iter()
        .map(|p| PrefillValue {
            source_field_id: p.source_field_id,
            label: p.source_field_label.clone(),
            value: source_value(source.as_ref(), &submission, p.source_field_id, Some(&p.source_field_label))
                .cloned(),
        })
        .collect())
}

/// Source form of an autofill field, always read from its linked dropdown
pub fn autofill_source_form(template: &FormTemplate, field: &Field) -> Option<TemplateId> {
    let link = field.autofill.as_ref()?;
    template
        .field(link.linked_dropdown_field_id)
        .filter(|f| f.field_type == FieldType::SubmissionDropdown)?
        .source_form_id
}

/// Value an autofill field takes given the dropdown selection in `data`
pub fn autofill_value(
    template: &FormTemplate,
    field: &Field,
    data: &SubmissionData,
    records: &dyn RecordSource,
) -> Option<Value> {
    let link = field.autofill.as_ref()?;
    let source_field_id = link.source_field_id?;
    let source_form_id = autofill_source_form(template, field)?;
    let dropdown = template.field(link.linked_dropdown_field_id)?;

    let raw = lookup(data, dropdown.id, &dropdown.label)?;
    let submission = selected_submission(raw, records).filter(|s| s.form_id == source_form_id)?;
    let source = records.template(source_form_id);
    source_value(source.as_ref(), &submission, source_field_id, None).cloned()
}

// =============================================================================
// Autofill configuration
// =============================================================================

/// Builder-side autofill configuration for one field.
///
/// Picking a different dropdown always drops the chosen source field, so a
/// link never points at a field of a form the dropdown no longer reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AutofillSetup {
    #[default]
    Unconfigured,
    DropdownSelected { dropdown_field_id: FieldId },
    SourceFieldSelected { dropdown_field_id: FieldId, source_field_id: FieldId },
    Confirmed(AutofillLink),
}

impl AutofillSetup {
    /// Resume from a stored link
    pub fn from_link(link: Option<&AutofillLink>) -> Self {
        match link {
            None => Self::Unconfigured,
            Some(AutofillLink { linked_dropdown_field_id, source_field_id: None }) => Self::DropdownSelected {
                dropdown_field_id: *linked_dropdown_field_id,
            },
            Some(link) => Self::Confirmed(link.clone()),
        }
    }

    pub fn dropdown(&self) -> Option<FieldId> {
        match self {
            Self::Unconfigured => None,
            Self::DropdownSelected { dropdown_field_id } => Some(*dropdown_field_id),
            Self::SourceFieldSelected { dropdown_field_id, .. } => Some(*dropdown_field_id),
            Self::Confirmed(link) => Some(link.linked_dropdown_field_id),
        }
    }

    pub fn source_field(&self) -> Option<FieldId> {
        match self {
            Self::SourceFieldSelected { source_field_id, .. } => Some(*source_field_id),
            Self::Confirmed(link) => link.source_field_id,
            _ => None,
        }
    }

    /// Pick the dropdown to read through. Re-picking the current one keeps the state.
    pub fn select_dropdown(self, template: &FormTemplate, dropdown_field_id: FieldId) -> Result<Self> {
        let is_dropdown = template
            .field(dropdown_field_id)
            .map(|f| f.field_type == FieldType::SubmissionDropdown)
            .unwrap_or(false);
        if !is_dropdown {
            return Err(FormsError::Validation(format!(
                "field {} is not a submission dropdown of this template",
                dropdown_field_id
            )));
        }
        if self.dropdown() == Some(dropdown_field_id) {
            return Ok(self);
        }
        Ok(Self::DropdownSelected { dropdown_field_id })
    }

    /// Pick the field of the source form to copy
    pub fn select_source_field(self, source_field_id: FieldId) -> Result<Self> {
        let dropdown_field_id = self
            .dropdown()
            .ok_or_else(|| FormsError::Validation("select a dropdown first".into()))?;
        Ok(Self::SourceFieldSelected { dropdown_field_id, source_field_id })
    }

    pub fn confirm(self) -> Result<Self> {
        match self {
            Self::SourceFieldSelected { dropdown_field_id, source_field_id } => Ok(Self::Confirmed(AutofillLink {
                linked_dropdown_field_id: dropdown_field_id,
                source_field_id: Some(source_field_id),
            })),
            Self::Confirmed(_) => Ok(self),
            _ => Err(FormsError::Validation("select a dropdown and a source field first".into())),
        }
    }

    /// The link to store, once confirmed
    pub fn link(&self) -> Option<&AutofillLink> {
        match self {
            Self::Confirmed(link) => Some(link),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldDraft, FieldPatch, PrefillField, TemplateDraft};
    use crate::records::StoreRecords;
    use crate::store::TemplateStore;
    use crate::submission::SubmissionStore;
    use serde_json::json;

    struct Fixture {
        templates: TemplateStore,
        submissions: SubmissionStore,
        team_form: TemplateId,
        player_form: TemplateId,
        dropdown: FieldId,
        coach_autofill: FieldId,
    }

    fn fixture() -> Fixture {
        let templates = TemplateStore::new();
        let submissions = SubmissionStore::new();

        let team = templates.create(TemplateDraft::new("Team Registration"));
        templates.add_field(team.id, None, FieldDraft::new(FieldType::Text, "Team Name")).unwrap();
        templates.add_field(team.id, None, FieldDraft::new(FieldType::Text, "Coach Name")).unwrap();

        let player = templates.create(TemplateDraft::new("Player Registration"));
        let mut draft = FieldDraft::new(FieldType::SubmissionDropdown, "Team");
        draft.source_form_id = Some(team.id);
        draft.display_field_id = Some(100);
        draft.prefill_fields = vec![PrefillField { source_field_id: 101, source_field_label: "Coach Name".into() }];
        let dropdown = templates.add_field(player.id, None, draft).unwrap();

        let mut coach = FieldDraft::new(FieldType::Text, "Coach");
        coach.autofill = Some(AutofillLink { linked_dropdown_field_id: dropdown.id, source_field_id: Some(101) });
        let coach = templates.add_field(player.id, None, coach).unwrap();

        let team_template = templates.get(team.id).unwrap();
        submissions.insert(&team_template, json!({"100": "Lions", "101": "Sam"}).as_object().cloned().unwrap());
        submissions.insert(&team_template, json!({"Team Name": "Tigers", "Coach Name": "Alex"}).as_object().cloned().unwrap());

        Fixture {
            templates,
            submissions,
            team_form: team.id,
            player_form: player.id,
            dropdown: dropdown.id,
            coach_autofill: coach.id,
        }
    }

    #[test]
    fn test_dropdown_options() {
        let f = fixture();
        let records = StoreRecords::new(&f.templates, &f.submissions);
        let player = f.templates.get(f.player_form).unwrap();
        let options = dropdown_options(player.field(f.dropdown).unwrap(), &records).unwrap();

        let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["Tigers", "Lions"]);
    }

    #[test]
    fn test_dropdown_options_needs_config() {
        let f = fixture();
        let records = StoreRecords::new(&f.templates, &f.submissions);
        let plain = Field::from_draft(1, 1, FieldDraft::new(FieldType::SubmissionDropdown, "Team"));
        assert!(matches!(dropdown_options(&plain, &records), Err(FormsError::Validation(_))));
    }

    #[test]
    fn test_prefill_from_selection() {
        let f = fixture();
        let records = StoreRecords::new(&f.templates, &f.submissions);
        let player = f.templates.get(f.player_form).unwrap();
        let values = prefill(player.field(f.dropdown).unwrap(), 2, &records).unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].value, Some(json!("Alex")));

        assert!(matches!(
            prefill(player.field(f.dropdown).unwrap(), 99, &records),
            Err(FormsError::SubmissionNotFound(99))
        ));
    }

    #[test]
    fn test_autofill_follows_dropdown() {
        let f = fixture();
        let records = StoreRecords::new(&f.templates, &f.submissions);
        let player = f.templates.get(f.player_form).unwrap();
        let coach = player.field(f.coach_autofill).unwrap();

        assert_eq!(autofill_source_form(&player, coach), Some(f.team_form));

        let mut data = SubmissionData::new();
        data.insert(f.dropdown.to_string(), json!("1"));
        assert_eq!(autofill_value(&player, coach, &data, &records), Some(json!("Sam")));

        // repointing the dropdown changes the derived source and clears the link's field
        let patch = FieldPatch { source_form_id: Some(77), ..Default::default() };
        f.templates.update_field(f.player_form, f.dropdown, patch).unwrap();
        let player = f.templates.get(f.player_form).unwrap();
        let coach = player.field(f.coach_autofill).unwrap();
        assert_eq!(autofill_source_form(&player, coach), Some(77));
        assert_eq!(autofill_value(&player, coach, &data, &records), None);
    }

    #[test]
    fn test_setup_state_machine() {
        let f = fixture();
        let player = f.templates.get(f.player_form).unwrap();

        let setup = AutofillSetup::default();
        assert!(setup.clone().select_source_field(101).is_err());
        assert!(setup.clone().select_dropdown(&player, f.coach_autofill).is_err());

        let setup = setup.select_dropdown(&player, f.dropdown).unwrap();
        let setup = setup.select_source_field(101).unwrap();
        assert_eq!(setup.source_field(), Some(101));

        // re-picking the same dropdown keeps the source field
        let setup = setup.select_dropdown(&player, f.dropdown).unwrap();
        assert_eq!(setup.source_field(), Some(101));

        let confirmed = setup.confirm().unwrap();
        assert_eq!(
            confirmed.link(),
            Some(&AutofillLink { linked_dropdown_field_id: f.dropdown, source_field_id: Some(101) })
        );
    }

    #[test]
    fn test_setup_new_dropdown_resets_source() {
        let f = fixture();
        let mut second = FieldDraft::new(FieldType::SubmissionDropdown, "Other Team");
        second.source_form_id = Some(f.team_form);
        second.display_field_id = Some(100);
        let second = f.templates.add_field(f.player_form, None, second).unwrap();
        let player = f.templates.get(f.player_form).unwrap();

        let stored = player.field(f.coach_autofill).unwrap().autofill.clone();
        let setup = AutofillSetup::from_link(stored.as_ref());
        assert_eq!(setup.source_field(), Some(101));

        let setup = setup.select_dropdown(&player, second.id).unwrap();
        assert_eq!(setup, AutofillSetup::DropdownSelected { dropdown_field_id: second.id });
        assert!(setup.confirm().is_err());
    }
}
