//! League Portal Form Builder
//!
//! Dynamic registration forms for teams, players and parents.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                          FORM BUILDER                                │
//! │                                                                      │
//! │  ┌────────────────┐   ┌────────────────┐   ┌──────────────────────┐  │
//! │  │ TemplateStore  │   │SubmissionStore │   │    DesignLibrary     │  │
//! │  │ pages / fields │   │ review+approval│   │ {designs, idCounter} │  │
//! │  └───────┬────────┘   └───────┬────────┘   └──────────────────────┘  │
//! │          │                    │                                      │
//! │          └──────► RecordSource ◄──────┐                              │
//! │                       │               │                              │
//! │         ┌─────────────┼───────────┐   │                              │
//! │         ▼             ▼           ▼   │                              │
//! │    ┌─────────┐  ┌──────────┐  ┌───────┴──┐                           │
//! │    │Resolver │─►│CSV Export│  │  Linker  │  prefill / autofill       │
//! │    │decompose│  └──────────┘  └──────────┘                           │
//! │    └─────────┘                                                       │
//! │                                                                      │
//! │  SubmissionService: intake, status, approval ─► SubmissionNotifier   │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Submission data is keyed by field id. Label keys written by older clients
//! are rewritten on intake and still honored on read; [`FieldReader`] finds
//! values by label or field type for code outside the builder.

pub mod designs;
pub mod export;
pub mod linker;
pub mod model;
pub mod reader;
pub mod records;
pub mod resolver;
pub mod service;
pub mod store;
pub mod submission;

use league_common::StoreError;
use thiserror::Error;

pub use designs::{Design, DesignDraft, DesignLibrary, DesignPatch};
pub use export::{csv_filename, export_csv, CsvExport};
pub use linker::{
    autofill_source_form, autofill_value, dropdown_options, prefill, AutofillSetup, DropdownOption,
    PrefillValue,
};
pub use model::{
    AutofillLink, DisplayLocation, Field, FieldDraft, FieldId, FieldOption, FieldPatch, FieldType,
    FormTemplate, Page, PageDraft, PageId, PagePatch, PrefillField, TemplateDraft, TemplateId,
    TemplateIssue, TemplatePatch,
};
pub use reader::FieldReader;
pub use records::{RecordSource, StoreRecords};
pub use resolver::{decompose, display_value, resolve, sub_labels, FieldPart, ResolvedEntry};
pub use service::{DisabledNotifier, NotificationOutcome, NotifyError, SubmissionNotifier, SubmissionService};
pub use store::{MoveDirection, TemplateStore, FIRST_FIELD_ID, FIRST_TEMPLATE_ID};
pub use submission::{
    normalize_keys, ApprovalStatus, ReviewStatus, Submission, SubmissionData, SubmissionFilter,
    SubmissionId, SubmissionStore,
};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum FormsError {
    #[error("Form template {0} not found")]
    TemplateNotFound(TemplateId),

    #[error("Field {0} not found")]
    FieldNotFound(FieldId),

    #[error("Page {0} not found")]
    PageNotFound(PageId),

    #[error("Submission {0} not found")]
    SubmissionNotFound(SubmissionId),

    #[error("Design {0} not found")]
    DesignNotFound(u64),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Template is not usable: {}", format_issues(.0))]
    NotUsable(Vec<TemplateIssue>),

    #[error(transparent)]
    Store(#[from] StoreError),
}

fn format_issues(issues: &[TemplateIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, FormsError>;
