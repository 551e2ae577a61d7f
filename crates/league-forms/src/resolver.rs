//! Field resolution
//!
//! [`decompose`] turns one field of a submission into labeled parts. The
//! submission viewer ([`resolve`]) and the CSV exporter both build on it, and
//! [`sub_labels`] is its data-independent header projection, so the two views
//! cannot drift apart.

use league_common::{format_amount, parse_amount};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::linker::{selected_submission, source_value};
use crate::model::{Field, FieldType, FormTemplate};
use crate::records::RecordSource;
use crate::submission::{lookup, Submission, SubmissionData};

/// One labeled value produced by a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldPart {
    pub label: String,
    pub value: String,
}

/// One row of the submission viewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedEntry {
    pub label: String,
    pub value: String,
    /// `false` for data keys no template field claims
    pub from_form: bool,
    pub parts: Vec<FieldPart>,
}

/// (key suffix, part name, default amount)
type PricingPart = (&'static str, &'static str, i64);

const KIT_PRICING: [PricingPart; 2] = [("basePrice", "Base Price", 150), ("markup", "Markup", 0)];
const ENTRY_FEE_PRICING: [PricingPart; 2] = [("baseFee", "Base Fee", 0), ("adjustment", "Adjustment", 0)];

const DESIGN_PARTS: [&str; 3] = ["Design", "Primary Color", "Secondary Color"];
const NOT_SELECTED: &str = "Not selected";
const NOT_AVAILABLE: &str = "N/A";

enum Layout {
    Plain,
    Pricing(&'static [PricingPart; 2]),
    DesignColors,
    Size,
    Dropdown,
}

fn layout(field: &Field) -> Layout {
    match field.field_type {
        FieldType::KitPricing => Layout::Pricing(&KIT_PRICING),
        FieldType::EntryFeePricing => Layout::Pricing(&ENTRY_FEE_PRICING),
        FieldType::ImageSelectLibrary if field.include_color_pickers => Layout::DesignColors,
        FieldType::ProductBundle => Layout::Size,
        FieldType::SubmissionDropdown => Layout::Dropdown,
        _ => Layout::Plain,
    }
}

fn composite_label(field: &Field, part: &str) -> String {
    format!("{} - {}", field.label, part)
}

/// Every label `field` can produce, in order
pub fn sub_labels(field: &Field) -> Vec<String> {
    match layout(field) {
        Layout::Plain => vec![field.label.clone()],
        Layout::Pricing(parts) => parts
            .iter()
            .map(|(_, name, _)| *name)
            .chain(std::iter::once("Total"))
            .map(|name| composite_label(field, name))
            .collect(),
        Layout::DesignColors => DESIGN_PARTS.iter().map(|name| composite_label(field, name)).collect(),
        Layout::Size => vec![composite_label(field, "Size")],
        Layout::Dropdown => std::iter::once(field.label.clone())
            .chain(
                field
                    .prefill_fields
                    .iter()
                    .map(|p| composite_label(field, &p.source_field_label)),
            )
            .collect(),
    }
}

/// Split one field of `data` into labeled parts.
///
/// Returns nothing when none of the field's keys are present. Composite
/// defaults only fill gaps once at least one of their keys exists.
pub fn decompose(field: &Field, data: &SubmissionData, records: &dyn RecordSource) -> Vec<FieldPart> {
    let labels = sub_labels(field);
    let values: Vec<String> = match layout(field) {
        Layout::Plain => match lookup(data, field.id, &field.label) {
            Some(value) => vec![display_value(value)],
            None => return Vec::new(),
        },
        Layout::Pricing(parts) => {
            let raw: Vec<Option<&Value>> = parts
                .iter()
                .map(|(suffix, _, _)| data.get(&field.part_key(suffix)))
                .collect();
            if raw.iter().all(Option::is_none) {
                return Vec::new();
            }
            let amounts: Vec<Decimal> = raw
                .iter()
                .zip(parts.iter())
                .map(|(value, (_, _, default))| {
                    value
                        .and_then(parse_amount)
                        .unwrap_or_else(|| Decimal::from(*default))
                })
                .collect();
            let total: Decimal = amounts.iter().sum();
            amounts
                .into_iter()
                .chain(std::iter::once(total))
                .map(format_amount)
                .collect()
        }
        Layout::DesignColors => {
            let design = lookup(data, field.id, &field.label);
            let primary = data.get(&field.part_key("primaryColor"));
            let secondary = data.get(&field.part_key("secondaryColor"));
            if design.is_none() && primary.is_none() && secondary.is_none() {
                return Vec::new();
            }
            vec![
                shown_or(design, NOT_SELECTED),
                shown_or(primary, NOT_AVAILABLE),
                shown_or(secondary, NOT_AVAILABLE),
            ]
        }
        Layout::Size => match data.get(&field.part_key("size")) {
            Some(size) => vec![display_value(size)],
            None => return Vec::new(),
        },
        Layout::Dropdown => {
            let raw = match lookup(data, field.id, &field.label) {
                Some(raw) => raw,
                None => return Vec::new(),
            };
            let linked = selected_submission(raw, records);
            let source = field.source_form_id.and_then(|id| records.template(id));

            let shown = match (&linked, field.display_field_id) {
                (Some(linked), Some(display_id)) => source_value(source.as_ref(), linked, display_id, None)
                    .map(display_value)
                    .unwrap_or_default(),
                _ => display_value(raw),
            };

            let mut values = vec![shown];
            for prefill in &field.prefill_fields {
                let value = linked
                    .as_ref()
                    .and_then(|s| {
                        source_value(
                            source.as_ref(),
                            s,
                            prefill.source_field_id,
                            Some(&prefill.source_field_label),
                        )
                    })
                    .map(display_value)
                    .unwrap_or_default();
                values.push(value);
            }
            values
        }
    };

    labels
        .into_iter()
        .zip(values)
        .map(|(label, value)| FieldPart { label, value })
        .collect()
}

fn shown_or(value: Option<&Value>, fallback: &str) -> String {
    value
        .map(display_value)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// One-line display of a decomposed field
fn summarize(field: &Field, parts: &[FieldPart]) -> String {
    let value = |i: usize| parts.get(i).map(|p| p.value.as_str()).unwrap_or_default();
    match layout(field) {
        Layout::Pricing(pricing) => {
            let names = pricing.iter().map(|(_, name, _)| *name).chain(std::iter::once("Total"));
            names
                .enumerate()
                .map(|(i, name)| format!("{}: R{}", name, value(i)))
                .collect::<Vec<_>>()
                .join(" | ")
        }
        Layout::DesignColors => format!(
            "Design: {} | Primary: {} | Secondary: {}",
            value(0),
            value(1),
            value(2)
        ),
        Layout::Size => format!("Size: {}", value(0)),
        Layout::Plain | Layout::Dropdown => value(0).to_string(),
    }
}

/// Ordered, labeled view of a submission.
///
/// Every declared field comes in declaration order, unanswered ones with an
/// empty value, followed by data keys no field claims.
/// An orphaned submission (`template == None`) resolves to extras only.
pub fn resolve(
    template: Option<&FormTemplate>,
    submission: &Submission,
    records: &dyn RecordSource,
) -> Vec<ResolvedEntry> {
    let fields: Vec<&Field> = template.map(|t| t.fields().collect()).unwrap_or_default();
    let mut entries = Vec::with_capacity(fields.len());

    for field in &fields {
        let parts = decompose(field, &submission.data, records);
        let value = if parts.is_empty() { String::new() } else { summarize(field, &parts) };
        entries.push(ResolvedEntry {
            label: field.label.clone(),
            value,
            from_form: true,
            parts,
        });
    }

    for (key, value) in &submission.data {
        if fields.iter().any(|f| f.claims_key(key)) {
            continue;
        }
        let shown = display_value(value);
        entries.push(ResolvedEntry {
            label: key.clone(),
            value: shown.clone(),
            from_form: false,
            parts: vec![FieldPart { label: key.clone(), value: shown }],
        });
    }

    entries
}

/// Render a stored value as text: lists joined with `, `, objects as JSON
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(display_value).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}
