//! CSV export of submissions
//!
//! Column headers are the union of every involved template's sub-labels and
//! each cell comes from [`decompose`], so exported values always match the
//! submission viewer.

use std::collections::{HashMap, HashSet};

use crate::model::{FormTemplate, TemplateId};
use crate::records::RecordSource;
use crate::resolver::{decompose, sub_labels};
use crate::submission::Submission;

const FIXED_HEADERS: [&str; 5] = ["ID", "Form Name", "Submitted At", "Status", "Approval Status"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub filename: String,
    pub content: String,
}

/// `all_form_submissions.csv`, or `{form_name}_submissions.csv` lowercased
/// with whitespace runs replaced by `_`
pub fn csv_filename(form_name: Option<&str>) -> String {
    match form_name {
        None => "all_form_submissions.csv".to_string(),
        Some(name) => {
            let mut slug = String::with_capacity(name.len());
            let mut in_run = false;
            for c in name.to_lowercase().chars() {
                if c.is_whitespace() {
                    if !in_run {
                        slug.push('_');
                    }
                    in_run = true;
                } else {
                    slug.push(c);
                    in_run = false;
                }
            }
            format!("{}_submissions.csv", slug)
        }
    }
}

/// Quote a cell, doubling embedded quotes
fn escape(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

/// Build a CSV of `submissions`.
///
/// `filter` is the template the export was restricted to, if any; it names the
/// file and contributes its headers even when it has no submissions.
pub fn export_csv(
    submissions: &[Submission],
    filter: Option<&FormTemplate>,
    records: &dyn RecordSource,
) -> CsvExport {
    let mut templates: Vec<FormTemplate> = Vec::new();
    let mut seen: HashSet<TemplateId> = HashSet::new();
    if let Some(t) = filter {
        seen.insert(t.id);
        templates.push(t.clone());
    }
    for s in submissions {
        if seen.insert(s.form_id) {
            if let Some(t) = records.template(s.form_id) {
                templates.push(t);
            }
        }
    }

    let mut headers: Vec<String> = FIXED_HEADERS.iter().map(|h| h.to_string()).collect();
    let mut known: HashSet<String> = headers.iter().cloned().collect();
    for template in &templates {
        for field in template.fields() {
            for label in sub_labels(field) {
                if known.insert(label.clone()) {
                    headers.push(label);
                }
            }
        }
    }

    let by_id: HashMap<TemplateId, &FormTemplate> = templates.iter().map(|t| (t.id, t)).collect();
    let mut lines = Vec::with_capacity(submissions.len() + 1);
    lines.push(headers.iter().map(|h| escape(h)).collect::<Vec<_>>().join(","));

    for submission in submissions {
        let mut values: HashMap<String, String> = HashMap::new();
        if let Some(template) = by_id.get(&submission.form_id) {
            for field in template.fields() {
                for part in decompose(field, &submission.data, records) {
                    values.entry(part.label).or_insert(part.value);
                }
            }
        }

        let fixed = [
            submission.id.to_string(),
            submission.form_name.clone(),
            submission.submitted_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            submission.status.to_string(),
            submission.approval_status.to_string(),
        ];
        let row: Vec<String> = fixed
            .iter()
            .map(|cell| escape(cell))
            .chain(
                headers[FIXED_HEADERS.len()..]
                    .iter()
                    .map(|h| escape(values.get(h).map(String::as_str).unwrap_or(""))),
            )
            .collect();
        lines.push(row.join(","));
    }

    tracing::debug!(rows = submissions.len(), columns = headers.len(), "csv export built");
    CsvExport {
        filename: csv_filename(filter.map(|t| t.name.as_str())),
        content: lines.join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldDraft, FieldType, TemplateDraft};
    use crate::records::StoreRecords;
    use crate::resolver::resolve;
    use crate::store::TemplateStore;
    use crate::submission::{SubmissionData, SubmissionStore};
    use serde_json::json;

    fn data(value: serde_json::Value) -> SubmissionData {
        value.as_object().cloned().unwrap()
    }

    /// Split a line of fully quoted cells
    fn cells(line: &str) -> Vec<String> {
        let inner = &line[1..line.len() - 1];
        inner.split("\",\"").map(|c| c.replace("\"\"", "\"")).collect()
    }

    fn setup() -> (TemplateStore, SubmissionStore, TemplateId, TemplateId) {
        let templates = TemplateStore::new();
        let submissions = SubmissionStore::new();

        let player = templates.create(TemplateDraft::new("Player Registration"));
        templates.add_field(player.id, None, FieldDraft::new(FieldType::Text, "Player Name")).unwrap();
        templates.add_field(player.id, None, FieldDraft::new(FieldType::KitPricing, "Kit Markup")).unwrap();

        let order = templates.create(TemplateDraft::new("Supporter  Order"));
        templates.add_field(order.id, None, FieldDraft::new(FieldType::Text, "Player Name")).unwrap();
        templates.add_field(order.id, None, FieldDraft::new(FieldType::ProductBundle, "Hoodie")).unwrap();

        let player_t = templates.get(player.id).unwrap();
        let order_t = templates.get(order.id).unwrap();
        submissions.insert(&player_t, data(json!({"Player Name": "Sam \"The Wall\"", "101_markup": 25})));
        submissions.insert(&player_t, data(json!({"Player Name": "Alex"})));
        submissions.insert(&order_t, data(json!({"103_size": "L", "102": "Jo"})));
        (templates, submissions, player.id, order.id)
    }

    #[test]
    fn test_headers_union_in_order() {
        let (templates, submissions, _, _) = setup();
        let records = StoreRecords::new(&templates, &submissions);
        let all = submissions.list(&Default::default());
        let export = export_csv(&all, None, &records);

        assert_eq!(export.filename, "all_form_submissions.csv");
        let header = cells(export.content.lines().next().unwrap());
        assert_eq!(
            header,
            vec![
                "ID", "Form Name", "Submitted At", "Status", "Approval Status",
                "Player Name", "Hoodie - Size",
                "Kit Markup - Base Price", "Kit Markup - Markup", "Kit Markup - Total",
            ]
        );
    }

    #[test]
    fn test_rows_are_rectangular() {
        let (templates, submissions, _, _) = setup();
        let records = StoreRecords::new(&templates, &submissions);
        let all = submissions.list(&Default::default());
        let export = export_csv(&all, None, &records);

        let lines: Vec<&str> = export.content.lines().collect();
        assert_eq!(lines.len(), all.len() + 1);
        let width = cells(lines[0]).len();
        for line in &lines {
            assert!(line.starts_with('"') && line.ends_with('"'));
            assert_eq!(cells(line).len(), width);
        }
        assert!(export.content.contains("\"Sam \"\"The Wall\"\"\""));
    }

    #[test]
    fn test_filtered_export_name() {
        let (templates, submissions, _, order_id) = setup();
        let records = StoreRecords::new(&templates, &submissions);
        let order = templates.get(order_id).unwrap();
        let rows = submissions.for_form(order_id);
        let export = export_csv(&rows, Some(&order), &records);
        assert_eq!(export.filename, "supporter_order_submissions.csv");
        assert_eq!(export.content.lines().count(), 2);
        assert_eq!(csv_filename(Some("Team Registration")), "team_registration_submissions.csv");
    }

    #[test]
    fn test_filename_keeps_edge_whitespace() {
        assert_eq!(csv_filename(Some(" Team ")), "_team__submissions.csv");
        assert_eq!(csv_filename(Some("U12\t Boys")), "u12_boys_submissions.csv");
        assert_eq!(csv_filename(None), "all_form_submissions.csv");
    }

    #[test]
    fn test_export_matches_viewer() {
        let (templates, submissions, player_id, _) = setup();
        let records = StoreRecords::new(&templates, &submissions);
        let player = templates.get(player_id).unwrap();
        let rows = submissions.for_form(player_id);
        let export = export_csv(&rows, Some(&player), &records);

        let lines: Vec<&str> = export.content.lines().collect();
        let header = cells(lines[0]);
        for (submission, line) in rows.iter().zip(&lines[1..]) {
            let row = cells(line);
            for entry in resolve(Some(&player), submission, &records) {
                for part in entry.parts {
                    let col = header.iter().position(|h| *h == part.label).unwrap();
                    assert_eq!(row[col], part.value);
                }
            }
        }
        // the composite with only a markup key still fills its defaults
        let sam = lines.iter().find(|l| l.contains("Sam")).unwrap();
        assert!(sam.ends_with("\"150\",\"25\",\"175\""));
    }
}
