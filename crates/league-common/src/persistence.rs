//! JSON document persistence
//!
//! Every file-backed store keeps one JSON document per file. Writes replace the
//! whole document (no partial patches) and are pretty-printed so the files stay
//! hand-editable.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{StoreError, StoreResult};

/// Handle to a single JSON document on disk
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    /// Create a handle; the file is not touched until read or written
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the backing file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the raw document. `Ok(None)` when the file does not exist yet.
    pub fn read_value(&self) -> StoreResult<Option<serde_json::Value>> {
        self.read()
    }

    /// Read and deserialize the document. `Ok(None)` when the file does not exist yet.
    pub fn read<T: DeserializeOwned>(&self) -> StoreResult<Option<T>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            })
    }

    /// Replace the document with `value`.
    ///
    /// The new content goes to a sibling temp file first and is renamed over the
    /// target, so readers never observe a half-written document.
    pub fn write<T: Serialize>(&self, value: &T) -> StoreResult<()> {
        let content = serde_json::to_string_pretty(value)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        tracing::debug!(path = %self.path.display(), "document written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Doc {
        designs: Vec<String>,
        id_counter: u64,
    }

    fn temp_file() -> JsonFile {
        JsonFile::new(std::env::temp_dir().join(format!("league-common-{}.json", uuid::Uuid::new_v4())))
    }

    #[test]
    fn test_missing_file_reads_none() {
        let file = temp_file();
        let doc: Option<Doc> = file.read().unwrap();
        assert!(doc.is_none());
    }

    #[test]
    fn test_write_then_read() {
        let file = temp_file();
        let doc = Doc { designs: vec!["Classic".into()], id_counter: 5 };
        file.write(&doc).unwrap();

        let raw = fs::read_to_string(file.path()).unwrap();
        assert!(raw.contains("\"idCounter\": 5"));

        let back: Doc = file.read().unwrap().unwrap();
        assert_eq!(back, doc);
        fs::remove_file(file.path()).ok();
    }

    #[test]
    fn test_corrupt_file_is_parse_error() {
        let file = temp_file();
        fs::write(file.path(), "{ not json").unwrap();
        let result: StoreResult<Option<Doc>> = file.read();
        assert!(matches!(result, Err(StoreError::Parse { .. })));
        fs::remove_file(file.path()).ok();
    }
}
