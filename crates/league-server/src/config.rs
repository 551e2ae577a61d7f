//! Server configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config location, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/league.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: String,
    /// Directory holding the JSON documents
    pub data_dir: PathBuf,
    /// Admin settings document, relative to `data_dir`
    pub settings_file: String,
    /// Design library document, relative to `data_dir`
    pub designs_file: String,
    /// Public site URL used in email links
    pub base_url: String,
    /// Log filter used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Outbound mail
    pub mail: MailConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".into(),
            data_dir: PathBuf::from("data"),
            settings_file: "adminSettings.json".into(),
            designs_file: "shirtDesigns.json".into(),
            base_url: "http://localhost:3000".into(),
            log_filter: "info".into(),
            mail: MailConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub from_name: String,
    pub from_email: String,
    /// When off, notifications are skipped instead of handed to the mailer
    pub enabled: bool,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from_name: "League Administration".into(),
            from_email: "noreply@league.example".into(),
            enabled: true,
        }
    }
}

impl ServerConfig {
    /// Load from a TOML file; `Ok(None)` when the file does not exist
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        toml::from_str(&content).map(Some).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Config file path from `LEAGUE_CONFIG`
    pub fn path_from_env() -> PathBuf {
        std::env::var("LEAGUE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Apply `LEAGUE_BIND_ADDR`, `LEAGUE_DATA_DIR` and `LEAGUE_BASE_URL`
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(addr) = lookup("LEAGUE_BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(dir) = lookup("LEAGUE_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("LEAGUE_BASE_URL") {
            self.base_url = url;
        }
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(&self.settings_file)
    }

    pub fn designs_path(&self) -> PathBuf {
        self.data_dir.join(&self.designs_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            bind_addr = "127.0.0.1:9000"

            [mail]
            enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.settings_path(), PathBuf::from("data/adminSettings.json"));
        assert!(!config.mail.enabled);
        assert_eq!(config.mail.from_name, "League Administration");
    }

    #[test]
    fn test_missing_file_is_none() {
        let path = std::env::temp_dir().join(format!("league-{}.toml", uuid::Uuid::new_v4()));
        assert!(ServerConfig::load(&path).unwrap().is_none());
    }

    #[test]
    fn test_invalid_file_is_error() {
        let path = std::env::temp_dir().join(format!("league-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "bind_addr = [").unwrap();
        assert!(matches!(ServerConfig::load(&path), Err(ConfigError::Parse { .. })));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("LEAGUE_DATA_DIR", "/var/lib/league"),
            ("LEAGUE_BASE_URL", "https://league.example"),
            ("LEAGUE_BIND_ADDR", " "),
        ]);
        let mut config = ServerConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.designs_path(), PathBuf::from("/var/lib/league/shirtDesigns.json"));
        assert_eq!(config.base_url, "https://league.example");
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
    }
}
