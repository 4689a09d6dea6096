//! Report proxy: resolves a configured log source, calls its upstream
//! endpoint and wraps whatever comes back in a report payload.
//!
//! Upstream trouble never turns into an HTTP error for the caller. It is
//! reported in-band as a sentinel string in `data`, so the report view can
//! show it in its raw-data panel.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use botdash_client::{RawResponse, ReportSource, SourceError};
use botdash_report::EXTERNAL_ERROR_PREFIX;
use serde::Serialize;
use serde_json::Value;

use crate::config::{LogSourceConfig, ServerConfig};

const NON_JSON_PREVIEW_CHARS: usize = 200;

/// Entry of the log-source listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogSourceSummary {
    pub id: u64,
    pub display_name: String,
    pub bot_id: u64,
    pub bot_name: String,
}

/// Status code and JSON body of a proxy answer.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyReply {
    pub status: u16,
    pub body: Value,
}

impl ProxyReply {
    fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: serde_json::json!({ "error": message }),
        }
    }
}

pub struct ReportProxy {
    sources: Vec<LogSourceConfig>,
    client: reqwest::Client,
}

impl ReportProxy {
    pub fn new(config: &ServerConfig) -> Result<Self, anyhow::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()?;
        Ok(Self {
            sources: config.sources.clone(),
            client,
        })
    }

    /// Sources whose bot is active, in configuration order.
    pub fn active_sources(&self) -> Vec<LogSourceSummary> {
        self.sources
            .iter()
            .filter(|s| s.active)
            .map(|s| LogSourceSummary {
                id: s.id,
                display_name: s.display_name.clone(),
                bot_id: s.bot_id,
                bot_name: s.bot_name.clone(),
            })
            .collect()
    }

    fn find_source(&self, raw_id: &str) -> Option<&LogSourceConfig> {
        let id: u64 = raw_id.trim().parse().ok()?;
        self.sources.iter().find(|s| s.id == id)
    }

    /// Answer for `GET show-custom-table?source_id=`.
    pub async fn show_custom_table(&self, source_id: Option<&str>) -> ProxyReply {
        let raw_id = match source_id {
            Some(id) if !id.trim().is_empty() => id,
            _ => return ProxyReply::error(400, "source_id is required"),
        };

        let Some(source) = self.find_source(raw_id) else {
            tracing::debug!(source_id = raw_id, "Unknown log source");
            return ProxyReply::error(404, "Log source not found");
        };

        let endpoint = source.endpoint.trim();
        let (data, columns) = self.fetch_upstream(endpoint).await;

        ProxyReply {
            status: 200,
            body: serde_json::json!({
                "log_source_id": source.id,
                "display_name": source.display_name,
                "endpoint": endpoint,
                "columns": columns,
                "data": data,
                "bot_name": source.bot_name,
            }),
        }
    }

    async fn fetch_upstream(&self, endpoint: &str) -> (Value, Vec<String>) {
        let resp = match self.client.get(endpoint).send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(endpoint, error = %e, "Upstream endpoint unreachable");
                return (
                    Value::String(format!("Connection error calling external endpoint: {}", e)),
                    Vec::new(),
                );
            }
        };

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(
                endpoint,
                status = status.as_u16(),
                "Upstream endpoint returned an error"
            );
            return (
                Value::String(format!(
                    "{} HTTP Error {}: {}",
                    EXTERNAL_ERROR_PREFIX,
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                )),
                Vec::new(),
            );
        }

        let text = match resp.text().await {
            Ok(t) => t,
            Err(e) => {
                return (
                    Value::String(format!("Connection error calling external endpoint: {}", e)),
                    Vec::new(),
                );
            }
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(data) => {
                let columns = first_row_columns(&data);
                (data, columns)
            }
            Err(_) => {
                let preview: String = text.chars().take(NON_JSON_PREVIEW_CHARS).collect();
                (
                    Value::String(format!(
                        "{} non-JSON data: {}...",
                        EXTERNAL_ERROR_PREFIX, preview
                    )),
                    Vec::new(),
                )
            }
        }
    }
}

/// Keys of the first element, in order, when the payload is a list of objects.
pub fn first_row_columns(data: &Value) -> Vec<String> {
    data.as_array()
        .and_then(|items| items.first())
        .and_then(Value::as_object)
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default()
}

/// Feeds a report controller straight from the proxy, without a network hop.
#[derive(Clone)]
pub struct InProcessSource {
    proxy: Arc<ReportProxy>,
}

impl InProcessSource {
    pub fn new(proxy: Arc<ReportProxy>) -> Self {
        Self { proxy }
    }
}

impl ReportSource for InProcessSource {
    fn fetch_report<'a>(
        &'a self,
        source_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let reply = self.proxy.show_custom_table(Some(source_id)).await;
            Ok(RawResponse::new(reply.status, reply.body.to_string()))
        })
    }
}
