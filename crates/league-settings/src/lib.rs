//! League Portal Admin Settings
//!
//! File-backed admin configuration and the email plumbing that reads it.
//!
//! ## Components
//!
//! - **SettingsStore**: one JSON document, deep-merged over built-in defaults
//!   so new default email templates reach old files without a migration
//! - **render**: `{placeholder}` substitution; unknown tokens stay verbatim
//! - **Mailer**: outbound port, with a logging implementation for development
//! - **EmailNotifier**: looks up a template, renders it and hands it to the mailer

pub mod mailer;
pub mod notifier;
pub mod settings;
pub mod store;
pub mod template;

use league_common::{PasswordError, StoreError};
use thiserror::Error;

pub use mailer::{LogMailer, MailError, Mailer, OutgoingEmail};
pub use notifier::EmailNotifier;
pub use settings::{
    AdminSettings, EmailTemplate, EmailTemplatePatch, SettingsPatch, SettingsView, TeamPortalTemplate,
    TeamPortalTemplatePatch,
};
pub use store::SettingsStore;
pub use template::{render, Placeholders, PLACEHOLDERS};

/// Settings error types
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("email template '{0}' not found")]
    TemplateNotFound(String),

    #[error("invalid setting: {0}")]
    Validation(String),

    #[error("settings could not be saved: {0}")]
    Persistence(#[from] StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Mail(#[from] MailError),
}

pub type Result<T> = std::result::Result<T, SettingsError>;
