//! Dashboard configuration loaded from TOML.
//!
//! Lookup order for the file: `--config`, then `$BOTDASH_CONFIG`, then
//! `<config dir>/botdash/config.toml`. A missing file at an implicit
//! location means built-in defaults; a missing explicit file is an error.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use botdash_client::ClientConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_ENV_VAR: &str = "BOTDASH_CONFIG";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:9380";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("duplicate log source id {0}")]
    DuplicateSourceId(u64),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub client: ClientConfig,
    pub server: ServerConfig,
}

/// Report proxy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Timeout for calls to a log source's upstream endpoint.
    pub upstream_timeout_secs: u64,
    pub sources: Vec<LogSourceConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            upstream_timeout_secs: DEFAULT_UPSTREAM_TIMEOUT_SECS,
            sources: Vec::new(),
        }
    }
}

/// A bot-side endpoint that serves one report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSourceConfig {
    pub id: u64,
    pub display_name: String,
    pub endpoint: String,
    pub bot_id: u64,
    pub bot_name: String,
    /// Sources of inactive bots are hidden from the listing.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl DashboardConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when no file exists at
    /// an implicit location.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match explicit {
            Some(p) => (Some(p.to_path_buf()), true),
            None => (Self::implicit_path(), false),
        };

        let Some(path) = path else {
            return Ok(Self::default());
        };

        if !required && !path.exists() {
            tracing::debug!(path = %path.display(), "No config file; using defaults");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(
            path = %path.display(),
            sources = config.server.sources.len(),
            "Loaded dashboard config"
        );
        Ok(config)
    }

    fn implicit_path() -> Option<PathBuf> {
        if let Ok(p) = std::env::var(CONFIG_ENV_VAR) {
            if !p.trim().is_empty() {
                return Some(PathBuf::from(p));
            }
        }
        dirs::config_dir().map(|d| d.join("botdash").join("config.toml"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for source in &self.server.sources {
            if !seen.insert(source.id) {
                return Err(ConfigError::DuplicateSourceId(source.id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[client]
reports_endpoint_base = "http://dash.internal/api/bot_reports/show-custom-table"
export_dir = "/tmp/exports"

[server]
bind_addr = "0.0.0.0:8080"

[[server.sources]]
id = 1
display_name = "Nightly Orders"
endpoint = "http://order-bot:5000/logs"
bot_id = 7
bot_name = "order-bot"

[[server.sources]]
id = 2
display_name = "Retired Feed"
endpoint = "http://old-bot/logs"
bot_id = 8
bot_name = "old-bot"
active = false
"#;

    #[test]
    fn parses_full_sample() {
        let cfg = DashboardConfig::from_toml_str(SAMPLE).expect("valid config");
        assert_eq!(
            cfg.client.reports_endpoint_base,
            "http://dash.internal/api/bot_reports/show-custom-table"
        );
        assert_eq!(cfg.client.request_timeout_secs, None);
        assert_eq!(cfg.client.export_dir, PathBuf::from("/tmp/exports"));
        assert_eq!(cfg.server.bind_addr, "0.0.0.0:8080");
        assert_eq!(cfg.server.upstream_timeout_secs, DEFAULT_UPSTREAM_TIMEOUT_SECS);
        assert_eq!(cfg.server.sources.len(), 2);
        assert!(cfg.server.sources[0].active);
        assert!(!cfg.server.sources[1].active);
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let cfg = DashboardConfig::from_toml_str("").expect("empty config");
        assert_eq!(cfg, DashboardConfig::default());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let text = r#"
[[server.sources]]
id = 3
display_name = "A"
endpoint = "http://a"
bot_id = 1
bot_name = "a"

[[server.sources]]
id = 3
display_name = "B"
endpoint = "http://b"
bot_id = 2
bot_name = "b"
"#;
        assert!(matches!(
            DashboardConfig::from_toml_str(text),
            Err(ConfigError::DuplicateSourceId(3))
        ));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            DashboardConfig::load(Some(&missing)),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn explicit_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let cfg = DashboardConfig::load(Some(&path)).expect("load");
        assert_eq!(cfg.server.sources[0].bot_name, "order-bot");
    }
}
