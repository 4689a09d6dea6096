use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_REPORTS_ENDPOINT: &str =
    "http://127.0.0.1:9380/api/bot_reports/show-custom-table";

/// Settings for a report view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Report endpoint; the source id is appended as `?source_id=`.
    pub reports_endpoint_base: String,
    /// Request timeout. `None` keeps the transport default (no timeout).
    pub request_timeout_secs: Option<u64>,
    /// Where exported CSV files are written by the terminal and CLI adapters.
    pub export_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            reports_endpoint_base: DEFAULT_REPORTS_ENDPOINT.to_string(),
            request_timeout_secs: None,
            export_dir: PathBuf::from("."),
        }
    }
}
