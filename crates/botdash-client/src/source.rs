//! Where report payloads come from.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;

use crate::config::ClientConfig;

/// Status and body of a report response, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

/// Fetches the report payload for a source id.
///
/// The HTTP implementation talks to the dashboard backend; the web view
/// plugs in an in-process implementation, and tests use canned responses.
pub trait ReportSource: Send + Sync {
    fn fetch_report<'a>(
        &'a self,
        source_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse, SourceError>> + Send + 'a>>;
}

/// `GET {reports_endpoint_base}?source_id={id}` over reqwest.
pub struct HttpReportSource {
    client: reqwest::Client,
    endpoint_base: String,
}

impl HttpReportSource {
    pub fn new(config: &ClientConfig) -> Result<Self, SourceError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| SourceError::Client(e.to_string()))?;
        Ok(Self {
            client,
            endpoint_base: config.reports_endpoint_base.clone(),
        })
    }

    pub fn endpoint_base(&self) -> &str {
        &self.endpoint_base
    }
}

impl ReportSource for HttpReportSource {
    fn fetch_report<'a>(
        &'a self,
        source_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            tracing::debug!(endpoint = %self.endpoint_base, source_id, "Fetching report");
            let resp = self
                .client
                .get(&self.endpoint_base)
                .query(&[("source_id", source_id)])
                .send()
                .await
                .map_err(|e| SourceError::Transport(e.to_string()))?;
            let status = resp.status().as_u16();
            let body = resp
                .text()
                .await
                .map_err(|e| SourceError::Transport(e.to_string()))?;
            Ok(RawResponse { status, body })
        })
    }
}
