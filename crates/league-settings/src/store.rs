//! File-backed admin settings store
//!
//! Reads re-sync from the backing file through [`SettingsStore::reload`] and
//! never fail: a missing file means defaults, a broken one is logged and the
//! last good in-memory copy is served. Writes update memory, then persist the
//! full merged document.

use league_common::{hash_password, verify_password, JsonFile};
use parking_lot::RwLock;
use serde_json::Value;
use std::path::PathBuf;

use crate::settings::{
    merge_over_defaults, AdminSettings, EmailTemplate, EmailTemplatePatch, SettingsPatch, TeamPortalTemplate,
    TeamPortalTemplatePatch,
};
use crate::{Result, SettingsError};

pub struct SettingsStore {
    file: JsonFile,
    current: RwLock<AdminSettings>,
}

impl SettingsStore {
    /// Open the store at `path` and load it once
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let store = Self {
            file: JsonFile::new(path),
            current: RwLock::new(AdminSettings::default()),
        };
        store.reload();
        store
    }

    /// Re-read the backing file and merge it over the defaults
    pub fn reload(&self) {
        let stored = match self.file.read_value() {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                tracing::debug!(path = %self.file.path().display(), "no settings file, using defaults");
                *self.current.write() = AdminSettings::default();
                return;
            }
            Err(e) => {
                tracing::error!("failed to read admin settings, keeping last known state: {}", e);
                return;
            }
        };

        let (stored, legacy_password) = take_legacy_password(stored);
        let defaults = match serde_json::to_value(AdminSettings::default()) {
            Ok(defaults) => defaults,
            Err(e) => {
                tracing::error!("failed to serialize default settings: {}", e);
                return;
            }
        };
        let mut settings: AdminSettings = match serde_json::from_value(merge_over_defaults(defaults, stored)) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::error!("admin settings file is malformed, keeping last known state: {}", e);
                return;
            }
        };

        if let Some(plaintext) = legacy_password.filter(|_| settings.password_hash.is_empty()) {
            match hash_password(&plaintext) {
                Ok(hash) => {
                    settings.password_hash = hash;
                    tracing::warn!("plaintext admin password found in settings file; rewriting it hashed");
                    if let Err(e) = self.file.write(&settings) {
                        tracing::error!("failed to rewrite settings with hashed password: {}", e);
                    }
                }
                Err(e) => tracing::error!("failed to hash legacy admin password: {}", e),
            }
        }

        *self.current.write() = settings;
    }

    /// Fresh copy of the settings
    pub fn snapshot(&self) -> AdminSettings {
        self.reload();
        self.current.read().clone()
    }

    pub fn admin_email(&self) -> String {
        self.snapshot().email
    }

    pub fn supplier_email(&self) -> String {
        self.snapshot().supplier_email
    }

    pub fn get_email_template(&self, key: &str) -> Option<EmailTemplate> {
        self.snapshot().email_templates.get(key).cloned()
    }

    pub fn update_admin_email(&self, email: &str) -> Result<AdminSettings> {
        validate_email(email)?;
        self.write(|s| {
            s.email = email.to_string();
            Ok(())
        })
    }

    /// Store a new admin password, hashed
    pub fn update_admin_password(&self, password: &str) -> Result<()> {
        let hash = hash_password(password)?;
        self.write(|s| {
            s.password_hash = hash;
            Ok(())
        })?;
        tracing::info!("admin password changed");
        Ok(())
    }

    pub fn update_supplier_email(&self, email: &str) -> Result<AdminSettings> {
        validate_email(email)?;
        self.write(|s| {
            s.supplier_email = email.to_string();
            Ok(())
        })
    }

    /// Patch an existing template. Unknown keys are refused, never created.
    pub fn update_email_template(&self, key: &str, patch: EmailTemplatePatch) -> Result<EmailTemplate> {
        let settings = self.write(|s| {
            let template = s
                .email_templates
                .get_mut(key)
                .ok_or_else(|| SettingsError::TemplateNotFound(key.to_string()))?;
            if let Some(subject) = patch.subject {
                template.subject = subject;
            }
            if let Some(body) = patch.body {
                template.body = body;
            }
            Ok(())
        })?;
        settings
            .email_templates
            .get(key)
            .cloned()
            .ok_or_else(|| SettingsError::TemplateNotFound(key.to_string()))
    }

    pub fn update_team_portal_template(&self, patch: TeamPortalTemplatePatch) -> Result<TeamPortalTemplate> {
        let settings = self.write(|s| {
            let portal = &mut s.team_portal_template;
            if let Some(title) = patch.title {
                portal.title = title;
            }
            if let Some(subtitle) = patch.subtitle {
                portal.subtitle = subtitle;
            }
            if let Some(header_start) = patch.header_start {
                portal.header_start = header_start;
            }
            if let Some(header_end) = patch.header_end {
                portal.header_end = header_end;
            }
            Ok(())
        })?;
        Ok(settings.team_portal_template)
    }

    /// Replace every section present in `patch`
    pub fn update_all(&self, patch: SettingsPatch) -> Result<AdminSettings> {
        if let Some(email) = &patch.email {
            validate_email(email)?;
        }
        if let Some(email) = &patch.supplier_email {
            validate_email(email)?;
        }
        self.write(|s| {
            if let Some(email) = patch.email {
                s.email = email;
            }
            if let Some(email) = patch.supplier_email {
                s.supplier_email = email;
            }
            if let Some(portal) = patch.team_portal_template {
                s.team_portal_template = portal;
            }
            if let Some(templates) = patch.email_templates {
                s.email_templates = templates;
            }
            Ok(())
        })
    }

    /// Constant-time check against the stored hash; `false` while no password is set
    pub fn verify_admin_password(&self, candidate: &str) -> bool {
        let hash = self.snapshot().password_hash;
        !hash.is_empty() && verify_password(candidate, &hash)
    }

    /// Sync, mutate in memory, then persist the full document
    fn write(&self, f: impl FnOnce(&mut AdminSettings) -> Result<()>) -> Result<AdminSettings> {
        self.reload();
        let mut current = self.current.write();
        f(&mut current)?;
        let settings = current.clone();
        drop(current);

        if let Err(e) = self.file.write(&settings) {
            tracing::error!("failed to persist admin settings: {}", e);
            return Err(e.into());
        }
        Ok(settings)
    }
}

/// Split off a plaintext `password` left by older versions
fn take_legacy_password(stored: Value) -> (Value, Option<String>) {
    match stored {
        Value::Object(mut map) => {
            let password = match map.remove("password") {
                Some(Value::String(p)) if !p.is_empty() => Some(p),
                _ => None,
            };
            (Value::Object(map), password)
        }
        other => (other, None),
    }
}

fn validate_email(email: &str) -> Result<()> {
    let trimmed = email.trim();
    match trimmed.split_once('@') {
        Some((user, domain)) if !user.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(SettingsError::Validation(format!("'{}' is not an email address", email))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("league-settings-{}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let store = SettingsStore::open(temp_path());
        let settings = store.snapshot();
        assert_eq!(settings, AdminSettings::default());
        assert!(!store.verify_admin_password("anything"));
    }

    #[test]
    fn test_partial_email_template_update() {
        let path = temp_path();
        let store = SettingsStore::open(&path);
        let pending_before = store.get_email_template("pending").unwrap();

        let patch = EmailTemplatePatch { subject: Some("X".into()), body: Some("Hi {coachName}".into()) };
        store.update_email_template("reviewed", patch).unwrap();

        assert_eq!(
            store.get_email_template("reviewed"),
            Some(EmailTemplate { subject: "X".into(), body: "Hi {coachName}".into() })
        );
        assert_eq!(store.get_email_template("pending"), Some(pending_before));
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_unknown_template_not_created() {
        let path = temp_path();
        let store = SettingsStore::open(&path);
        let err = store.update_email_template("welcome", EmailTemplatePatch::default()).unwrap_err();
        assert!(matches!(err, SettingsError::TemplateNotFound(_)));
        assert!(store.get_email_template("welcome").is_none());
    }

    #[test]
    fn test_write_through_pretty_document() {
        let path = temp_path();
        let store = SettingsStore::open(&path);
        store.update_supplier_email("kit@supplier.example").unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\n  \"supplierEmail\": \"kit@supplier.example\""));
        assert!(raw.contains("emailTemplates"));

        let reopened = SettingsStore::open(&path);
        assert_eq!(reopened.supplier_email(), "kit@supplier.example");
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_reads_pick_up_external_edits() {
        let path = temp_path();
        let store = SettingsStore::open(&path);
        store.update_admin_email("first@league.example").unwrap();

        let other = SettingsStore::open(&path);
        other.update_admin_email("second@league.example").unwrap();
        assert_eq!(store.admin_email(), "second@league.example");
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_corrupt_file_keeps_last_state() {
        let path = temp_path();
        let store = SettingsStore::open(&path);
        store.update_admin_email("ops@league.example").unwrap();

        fs::write(&path, "{ broken").unwrap();
        assert_eq!(store.admin_email(), "ops@league.example");
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_old_file_gains_new_templates() {
        let path = temp_path();
        fs::write(
            &path,
            r#"{"email": "old@league.example", "supplierEmail": "s@league.example",
                "emailTemplates": {"pending": {"subject": "Old", "body": "Old body"}}}"#,
        )
        .unwrap();
        let store = SettingsStore::open(&path);
        let settings = store.snapshot();
        assert_eq!(settings.email_templates["pending"].subject, "Old");
        assert!(settings.email_templates.contains_key("parentPaymentSuccess"));
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_password_hashed_and_verified() {
        let path = temp_path();
        let store = SettingsStore::open(&path);
        store.update_admin_password("s3cret!").unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("s3cret!"));
        assert!(store.verify_admin_password("s3cret!"));
        assert!(!store.verify_admin_password("wrong"));
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_legacy_plaintext_password_migrated() {
        let path = temp_path();
        fs::write(&path, r#"{"email": "a@league.example", "password": "letmein"}"#).unwrap();
        let store = SettingsStore::open(&path);

        assert!(store.verify_admin_password("letmein"));
        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("letmein"));
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_rejects_bad_email() {
        let store = SettingsStore::open(temp_path());
        assert!(matches!(store.update_admin_email("nobody"), Err(SettingsError::Validation(_))));
    }
}
