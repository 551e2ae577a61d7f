//! Kit design library
//!
//! Option source for `image-select-library` fields. Persisted as one
//! `{designs, idCounter}` document that admins may also edit by hand, so every
//! operation re-syncs from disk first.

use chrono::{DateTime, Utc};
use league_common::JsonFile;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{FormsError, Result};

const FIRST_DESIGN_ID: u64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Design {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    /// Single-image form kept for older documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl Design {
    /// First image, falling back to the legacy `imageUrl`
    pub fn main_image(&self) -> &str {
        self.images
            .first()
            .map(String::as_str)
            .or(self.image_url.as_deref())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DesignDocument {
    designs: Vec<Design>,
    id_counter: u64,
}

impl Default for DesignDocument {
    fn default() -> Self {
        Self {
            designs: Vec::new(),
            id_counter: FIRST_DESIGN_ID,
        }
    }
}

/// File-backed design library
pub struct DesignLibrary {
    file: JsonFile,
    doc: RwLock<DesignDocument>,
}

impl DesignLibrary {
    /// Open the library at `path`; a missing or unreadable file starts empty
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let library = Self {
            file: JsonFile::new(path),
            doc: RwLock::new(DesignDocument::default()),
        };
        library.reload();
        library
    }

    /// Re-read the backing file. Failures are logged and the in-memory copy kept.
    pub fn reload(&self) {
        match self.file.read::<DesignDocument>() {
            Ok(Some(doc)) => *self.doc.write() = doc,
            Ok(None) => {}
            Err(e) => tracing::error!("failed to load design library: {}", e),
        }
    }

    pub fn list(&self, active_only: bool) -> Vec<Design> {
        self.reload();
        self.doc
            .read()
            .designs
            .iter()
            .filter(|d| !active_only || d.active)
            .cloned()
            .collect()
    }

    pub fn get(&self, id: u64) -> Option<Design> {
        self.reload();
        self.doc.read().designs.iter().find(|d| d.id == id).cloned()
    }

    pub fn add(&self, draft: DesignDraft) -> Result<Design> {
        self.reload();
        let mut doc = self.doc.write();
        let design = Design {
            id: doc.id_counter,
            name: draft.name,
            description: draft.description,
            images: draft.images,
            image_url: None,
            active: draft.active.unwrap_or(true),
            created_at: Utc::now(),
        };
        doc.id_counter += 1;
        doc.designs.push(design.clone());
        self.file.write(&*doc)?;

        tracing::info!(design_id = design.id, name = %design.name, "design added");
        Ok(design)
    }

    pub fn update(&self, id: u64, patch: DesignPatch) -> Result<Design> {
        self.mutate(id, |design| {
            if let Some(name) = patch.name {
                design.name = name;
            }
            if let Some(description) = patch.description {
                design.description = description;
            }
            if let Some(images) = patch.images {
                design.images = images;
            }
            if let Some(active) = patch.active {
                design.active = active;
            }
        })
    }

    pub fn toggle_active(&self, id: u64) -> Result<Design> {
        self.mutate(id, |design| design.active = !design.active)
    }

    pub fn delete(&self, id: u64) -> Result<bool> {
        self.reload();
        let mut doc = self.doc.write();
        let before = doc.designs.len();
        doc.designs.retain(|d| d.id != id);
        if doc.designs.len() == before {
            return Ok(false);
        }
        self.file.write(&*doc)?;
        tracing::info!(design_id = id, "design deleted");
        Ok(true)
    }

    fn mutate(&self, id: u64, f: impl FnOnce(&mut Design)) -> Result<Design> {
        self.reload();
        let mut doc = self.doc.write();
        let design = doc
            .designs
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(FormsError::DesignNotFound(id))?;
        f(design);
        let updated = design.clone();
        self.file.write(&*doc)?;
        Ok(updated)
    }
}
