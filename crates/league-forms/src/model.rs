//! Form template domain types
//!
//! A template always stores its fields as pages. A single-page template is one
//! page with `multi_page == false`; the wire format still renders it as a flat
//! `fields` array so existing clients see exactly one of `fields` or `pages`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub type TemplateId = u64;
pub type FieldId = u64;
pub type PageId = u64;

// =============================================================================
// Field Types
// =============================================================================

/// Field type tag. Unknown tags are preserved in `Other`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    #[default]
    Text,
    Email,
    Tel,
    Number,
    Date,
    Textarea,
    Password,
    Radio,
    Checkbox,
    Select,
    ImageSelect,
    ImageSelectLibrary,
    SubmissionDropdown,
    KitPricing,
    EntryFeePricing,
    ProductBundle,
    File,
    Other(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Tel => "tel",
            Self::Number => "number",
            Self::Date => "date",
            Self::Textarea => "textarea",
            Self::Password => "password",
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
            Self::Select => "select",
            Self::ImageSelect => "image-select",
            Self::ImageSelectLibrary => "image-select-library",
            Self::SubmissionDropdown => "submission-dropdown",
            Self::KitPricing => "kit-pricing",
            Self::EntryFeePricing => "entry-fee-pricing",
            Self::ProductBundle => "product-bundle",
            Self::File => "file",
            Self::Other(tag) => tag,
        }
    }

    /// Types that are unusable without a non-empty options list
    pub fn needs_options(&self) -> bool {
        matches!(self, Self::Radio | Self::Checkbox | Self::Select | Self::ImageSelect)
    }
}

impl From<String> for FieldType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "text" => Self::Text,
            "email" => Self::Email,
            "tel" => Self::Tel,
            "number" => Self::Number,
            "date" => Self::Date,
            "textarea" => Self::Textarea,
            "password" => Self::Password,
            "radio" => Self::Radio,
            "checkbox" => Self::Checkbox,
            "select" => Self::Select,
            "image-select" => Self::ImageSelect,
            "image-select-library" => Self::ImageSelectLibrary,
            "submission-dropdown" => Self::SubmissionDropdown,
            "kit-pricing" => Self::KitPricing,
            "entry-fee-pricing" => Self::EntryFeePricing,
            "product-bundle" => Self::ProductBundle,
            "file" => Self::File,
            _ => Self::Other(tag),
        }
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Choice option: plain text, or a named image for image-select fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldOption {
    Text(String),
    Image {
        name: String,
        #[serde(rename = "imageUrl", default)]
        image_url: String,
    },
}

impl FieldOption {
    pub fn name(&self) -> &str {
        match self {
            Self::Text(name) => name,
            Self::Image { name, .. } => name,
        }
    }
}

/// Field of the linked submission shown read-only next to a submission dropdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefillField {
    pub source_field_id: FieldId,
    pub source_field_label: String,
}

/// Reverse link: this field takes its value from the submission picked in a
/// dropdown elsewhere in the same template.
///
/// The source form is never stored here; it is always read from the linked
/// dropdown's current `source_form_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutofillLink {
    pub linked_dropdown_field_id: FieldId,
    #[serde(default)]
    pub source_field_id: Option<FieldId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayLocation {
    Category,
    FormsPage,
    Homepage,
}

// =============================================================================
// Field
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: FieldId,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    #[serde(default)]
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_form_id: Option<TemplateId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_field_id: Option<FieldId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prefill_fields: Vec<PrefillField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autofill: Option<AutofillLink>,
    #[serde(default)]
    pub include_color_pickers: bool,
}

impl Field {
    pub(crate) fn from_draft(id: FieldId, order: u32, draft: FieldDraft) -> Self {
        Self {
            id,
            field_type: draft.field_type,
            label: draft.label,
            placeholder: draft.placeholder,
            required: draft.required,
            options: draft.options,
            order,
            help_text: draft.help_text,
            source_form_id: draft.source_form_id,
            display_field_id: draft.display_field_id,
            prefill_fields: draft.prefill_fields,
            autofill: draft.autofill,
            include_color_pickers: draft.include_color_pickers,
        }
    }

    /// Canonical data key for this field's value
    pub fn key(&self) -> String {
        self.id.to_string()
    }

    /// Synthetic key for one part of a composite value, e.g. `101_basePrice`
    pub fn part_key(&self, suffix: &str) -> String {
        format!("{}_{}", self.id, suffix)
    }

    /// Whether data stored under `key` belongs to this field
    pub fn claims_key(&self, key: &str) -> bool {
        if key == self.key() || key == self.label {
            return true;
        }
        let prefix = format!("{}_", self.id);
        key.starts_with(&prefix)
    }

    fn apply(&mut self, patch: FieldPatch) {
        if let Some(field_type) = patch.field_type {
            self.field_type = field_type;
        }
        if let Some(label) = patch.label {
            self.label = label;
        }
        if let Some(placeholder) = patch.placeholder {
            self.placeholder = Some(placeholder);
        }
        if let Some(required) = patch.required {
            self.required = required;
        }
        if let Some(options) = patch.options {
            self.options = options;
        }
        if let Some(help_text) = patch.help_text {
            self.help_text = Some(help_text);
        }
        if let Some(source_form_id) = patch.source_form_id {
            self.source_form_id = Some(source_form_id);
        }
        if let Some(display_field_id) = patch.display_field_id {
            self.display_field_id = Some(display_field_id);
        }
        if let Some(prefill_fields) = patch.prefill_fields {
            self.prefill_fields = prefill_fields;
        }
        if let Some(autofill) = patch.autofill {
            self.autofill = Some(autofill);
        }
        if patch.clear_autofill {
            self.autofill = None;
        }
        if let Some(include) = patch.include_color_pickers {
            self.include_color_pickers = include;
        }
    }
}

/// New field as submitted by the builder; id and order are assigned by the store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDraft {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub label: String,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<FieldOption>,
    #[serde(default)]
    pub help_text: Option<String>,
    #[serde(default)]
    pub source_form_id: Option<TemplateId>,
    #[serde(default)]
    pub display_field_id: Option<FieldId>,
    #[serde(default)]
    pub prefill_fields: Vec<PrefillField>,
    #[serde(default)]
    pub autofill: Option<AutofillLink>,
    #[serde(default)]
    pub include_color_pickers: bool,
}

impl FieldDraft {
    pub fn new(field_type: FieldType, label: impl Into<String>) -> Self {
        Self {
            field_type,
            label: label.into(),
            ..Default::default()
        }
    }
}

/// Partial field update; `None` leaves the attribute untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldPatch {
    #[serde(default, rename = "type")]
    pub field_type: Option<FieldType>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub options: Option<Vec<FieldOption>>,
    #[serde(default)]
    pub help_text: Option<String>,
    #[serde(default)]
    pub source_form_id: Option<TemplateId>,
    #[serde(default)]
    pub display_field_id: Option<FieldId>,
    #[serde(default)]
    pub prefill_fields: Option<Vec<PrefillField>>,
    #[serde(default)]
    pub autofill: Option<AutofillLink>,
    #[serde(default)]
    pub clear_autofill: bool,
    #[serde(default)]
    pub include_color_pickers: Option<bool>,
}

// =============================================================================
// Page
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub page_id: PageId,
    #[serde(rename = "pageTitle", alias = "title", default)]
    pub title: String,
    #[serde(rename = "pageDescription", alias = "description", default)]
    pub description: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Page {
    pub(crate) fn new(page_id: PageId, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            page_id,
            title: title.into(),
            description: description.into(),
            fields: Vec::new(),
        }
    }

    /// Rewrite `order` as 1..n following the current position
    pub(crate) fn renumber(&mut self) {
        for (index, field) in self.fields.iter_mut().enumerate() {
            field.order = index as u32 + 1;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PagePatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

// =============================================================================
// Template
// =============================================================================

/// Reasons a template cannot be activated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "camelCase")]
pub enum TemplateIssue {
    MissingOptions { field_id: FieldId, label: String },
    MissingSourceForm { field_id: FieldId, label: String },
    MissingDisplayField { field_id: FieldId, label: String },
    DanglingAutofill { field_id: FieldId, label: String, linked_dropdown_field_id: FieldId },
}

impl fmt::Display for TemplateIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingOptions { label, .. } => write!(f, "field '{}' needs at least one option", label),
            Self::MissingSourceForm { label, .. } => write!(f, "dropdown '{}' has no source form", label),
            Self::MissingDisplayField { label, .. } => write!(f, "dropdown '{}' has no display field", label),
            Self::DanglingAutofill { label, linked_dropdown_field_id, .. } => write!(
                f,
                "field '{}' autofills from missing dropdown {}",
                label, linked_dropdown_field_id
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TemplateWire", into = "TemplateWire")]
pub struct FormTemplate {
    pub id: TemplateId,
    pub name: String,
    pub description: String,
    pub active: bool,
    pub category_ids: BTreeSet<u64>,
    pub display_locations: BTreeSet<DisplayLocation>,
    multi_page: bool,
    pages: Vec<Page>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FormTemplate {
    pub(crate) fn create(id: TemplateId, draft: TemplateDraft) -> Self {
        let now = Utc::now();
        let display_locations = if draft.display_locations.is_empty() {
            BTreeSet::from([DisplayLocation::FormsPage])
        } else {
            draft.display_locations
        };
        Self {
            id,
            name: draft.name,
            description: draft.description,
            active: true,
            category_ids: draft.category_ids,
            display_locations,
            multi_page: false,
            pages: vec![Page::new(1, "", "")],
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_multi_page(&self) -> bool {
        self.multi_page
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, page_id: PageId) -> Option<&Page> {
        self.pages.iter().find(|p| p.page_id == page_id)
    }

    /// Every field in page order
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.pages.iter().flat_map(|p| p.fields.iter())
    }

    pub fn field(&self, field_id: FieldId) -> Option<&Field> {
        self.fields().find(|f| f.id == field_id)
    }

    pub fn field_by_label(&self, label: &str) -> Option<&Field> {
        self.fields().find(|f| f.label == label)
    }

    /// Everything that keeps this template from being activated
    pub fn issues(&self) -> Vec<TemplateIssue> {
        let mut issues = Vec::new();
        for field in self.fields() {
            if field.field_type.needs_options() && field.options.is_empty() {
                issues.push(TemplateIssue::MissingOptions {
                    field_id: field.id,
                    label: field.label.clone(),
                });
            }
            if field.field_type == FieldType::SubmissionDropdown {
                if field.source_form_id.is_none() {
                    issues.push(TemplateIssue::MissingSourceForm {
                        field_id: field.id,
                        label: field.label.clone(),
                    });
                }
                if field.display_field_id.is_none() {
                    issues.push(TemplateIssue::MissingDisplayField {
                        field_id: field.id,
                        label: field.label.clone(),
                    });
                }
            }
            if let Some(link) = &field.autofill {
                let linked_ok = self
                    .field(link.linked_dropdown_field_id)
                    .map(|f| f.field_type == FieldType::SubmissionDropdown)
                    .unwrap_or(false);
                if !linked_ok {
                    issues.push(TemplateIssue::DanglingAutofill {
                        field_id: field.id,
                        label: field.label.clone(),
                        linked_dropdown_field_id: link.linked_dropdown_field_id,
                    });
                }
            }
        }
        issues
    }

    pub(crate) fn pages_mut(&mut self) -> &mut Vec<Page> {
        &mut self.pages
    }

    pub(crate) fn set_layout(&mut self, multi_page: bool, pages: Vec<Page>) {
        self.multi_page = multi_page;
        self.pages = pages;
    }

    /// Position of `field_id` as (page index, field index)
    pub(crate) fn locate(&self, field_id: FieldId) -> Option<(usize, usize)> {
        self.pages.iter().enumerate().find_map(|(pi, page)| {
            page.fields
                .iter()
                .position(|f| f.id == field_id)
                .map(|fi| (pi, fi))
        })
    }

    pub(crate) fn field_mut(&mut self, field_id: FieldId) -> Option<&mut Field> {
        let (pi, fi) = self.locate(field_id)?;
        self.pages.get_mut(pi)?.fields.get_mut(fi)
    }

    pub(crate) fn apply_field_patch(&mut self, field_id: FieldId, patch: FieldPatch) -> Option<Field> {
        let field = self.field_mut(field_id)?;
        field.apply(patch);
        Some(field.clone())
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Wire shape: exactly one of `fields` (single page) or `multiPage` + `pages`
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplateWire {
    id: TemplateId,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    active: bool,
    #[serde(default)]
    category_ids: BTreeSet<u64>,
    #[serde(default)]
    display_locations: BTreeSet<DisplayLocation>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    multi_page: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fields: Option<Vec<Field>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pages: Option<Vec<Page>>,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    updated_at: DateTime<Utc>,
}

impl From<FormTemplate> for TemplateWire {
    fn from(t: FormTemplate) -> Self {
        let (fields, pages) = if t.multi_page {
            (None, Some(t.pages))
        } else {
            let fields = t.pages.into_iter().flat_map(|p| p.fields).collect();
            (Some(fields), None)
        };
        Self {
            id: t.id,
            name: t.name,
            description: t.description,
            active: t.active,
            category_ids: t.category_ids,
            display_locations: t.display_locations,
            multi_page: t.multi_page,
            fields,
            pages,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

impl TryFrom<TemplateWire> for FormTemplate {
    type Error = String;

    fn try_from(wire: TemplateWire) -> Result<Self, Self::Error> {
        let (multi_page, pages) = match (wire.multi_page, wire.fields, wire.pages) {
            (true, fields, Some(pages))
                if !pages.is_empty() && fields.as_ref().map_or(true, |f| f.is_empty()) =>
            {
                (true, pages)
            }
            (true, _, _) => return Err("multi-page template needs a non-empty `pages` list and no `fields`".into()),
            (false, Some(fields), None) => {
                let mut page = Page::new(1, "", "");
                page.fields = fields;
                (false, vec![page])
            }
            (false, _, _) => return Err("single-page template needs `fields` and no `pages`".into()),
        };
        Ok(Self {
            id: wire.id,
            name: wire.name,
            description: wire.description,
            active: wire.active,
            category_ids: wire.category_ids,
            display_locations: wire.display_locations,
            multi_page,
            pages,
            created_at: wire.created_at,
            updated_at: wire.updated_at,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category_ids: BTreeSet<u64>,
    #[serde(default)]
    pub display_locations: BTreeSet<DisplayLocation>,
}

impl TemplateDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Shallow metadata update. Structure (fields, pages) has its own operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub category_ids: Option<BTreeSet<u64>>,
    #[serde(default)]
    pub display_locations: Option<BTreeSet<DisplayLocation>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(multi_page: bool) -> FormTemplate {
        let mut t = FormTemplate::create(5, TemplateDraft::new("Team Registration"));
        let mut page = Page::new(1, "Team Information", "");
        page.fields.push(Field::from_draft(100, 1, FieldDraft::new(FieldType::Text, "Team Name")));
        t.set_layout(multi_page, vec![page]);
        t
    }

    #[test]
    fn test_field_type_tags() {
        let t: FieldType = serde_json::from_value(json!("kit-pricing")).unwrap();
        assert_eq!(t, FieldType::KitPricing);
        let other: FieldType = serde_json::from_value(json!("supporter-apparel")).unwrap();
        assert_eq!(other, FieldType::Other("supporter-apparel".into()));
        assert_eq!(serde_json::to_value(&other).unwrap(), json!("supporter-apparel"));
    }

    #[test]
    fn test_single_page_wire_shape() {
        let value = serde_json::to_value(sample(false)).unwrap();
        assert!(value.get("fields").is_some());
        assert!(value.get("pages").is_none());
        assert!(value.get("multiPage").is_none());
        assert_eq!(value["fields"][0]["type"], "text");
    }

    #[test]
    fn test_multi_page_wire_shape() {
        let value = serde_json::to_value(sample(true)).unwrap();
        assert!(value.get("fields").is_none());
        assert_eq!(value["multiPage"], true);
        assert_eq!(value["pages"][0]["pageTitle"], "Team Information");

        let back: FormTemplate = serde_json::from_value(value).unwrap();
        assert!(back.is_multi_page());
        assert_eq!(back.fields().count(), 1);
    }

    #[test]
    fn test_wire_rejects_both_shapes() {
        let value = json!({
            "id": 1, "name": "Broken", "multiPage": true,
            "fields": [{"id": 100, "type": "text", "label": "Team Name"}],
            "pages": [{"pageId": 1, "pageTitle": "A", "fields": []}]
        });
        assert!(serde_json::from_value::<FormTemplate>(value).is_err());
        let neither = json!({"id": 1, "name": "Broken"});
        assert!(serde_json::from_value::<FormTemplate>(neither).is_err());
    }

    #[test]
    fn test_multi_page_accepts_empty_fields() {
        let value = json!({
            "id": 7, "name": "Player Registration", "multiPage": true, "fields": [],
            "pages": [{"pageId": 1, "pageTitle": "Player", "fields": [{"id": 100, "type": "text", "label": "Player Name"}]}]
        });
        let template: FormTemplate = serde_json::from_value(value).unwrap();
        assert!(template.is_multi_page());
        assert_eq!(template.field(100).map(|f| f.label.as_str()), Some("Player Name"));
    }

    #[test]
    fn test_option_shapes() {
        let options: Vec<FieldOption> =
            serde_json::from_value(json!(["Small", {"name": "Stripes", "imageUrl": "/s.png"}])).unwrap();
        assert_eq!(options[0].name(), "Small");
        assert_eq!(options[1].name(), "Stripes");
    }

    #[test]
    fn test_issues() {
        let mut t = sample(false);
        let select = Field::from_draft(101, 2, FieldDraft::new(FieldType::Select, "Age Group"));
        let dropdown = Field::from_draft(102, 3, FieldDraft::new(FieldType::SubmissionDropdown, "Team"));
        let mut autofill = Field::from_draft(103, 4, FieldDraft::new(FieldType::Text, "Coach"));
        autofill.autofill = Some(AutofillLink { linked_dropdown_field_id: 999, source_field_id: None });
        t.pages_mut()[0].fields.extend([select, dropdown, autofill]);

        let issues = t.issues();
        assert_eq!(issues.len(), 4);
        assert!(matches!(issues[0], TemplateIssue::MissingOptions { field_id: 101, .. }));
        assert!(matches!(issues[3], TemplateIssue::DanglingAutofill { linked_dropdown_field_id: 999, .. }));
    }

    #[test]
    fn test_claims_key() {
        let field = Field::from_draft(101, 1, FieldDraft::new(FieldType::KitPricing, "Kit"));
        assert!(field.claims_key("101"));
        assert!(field.claims_key("Kit"));
        assert!(field.claims_key("101_basePrice"));
        assert!(!field.claims_key("1011"));
    }
}
