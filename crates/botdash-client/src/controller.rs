//! Report controller: one instance per report view.
//!
//! Lifecycle: `Idle` → `Loading` → one of `Ready`, `NoData` or `Failed`.
//! Only `Ready` accepts search input; export additionally needs at least
//! one displayed row. Every failure ends up as a [`ViewState`], never as a
//! returned error.

use botdash_report::{
    filter_indices, normalize_term, render_table, CsvExport, Dataset, Report, ReportError,
    ReportInfo, Row, TableView,
};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::source::{HttpReportSource, ReportSource, SourceError};

/// What the report region currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Idle,
    Loading { source_id: String },
    Ready,
    /// Non-terminal: the report arrived but carried no usable rows.
    NoData(NoDataPanel),
    /// Terminal for this view.
    Failed(ReportError),
}

/// Diagnostic panel with the raw payload of an unusable report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoDataPanel {
    pub title: String,
    pub raw: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// Transient message for the user, consumed by the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

pub struct ReportController<S> {
    source: S,
    state: ViewState,
    info: ReportInfo,
    dataset: Dataset,
    /// Indices into `dataset.rows`, in order.
    displayed: Vec<usize>,
    term: String,
    notice: Option<Notice>,
}

impl ReportController<HttpReportSource> {
    /// Controller that fetches over HTTP from `config.reports_endpoint_base`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, SourceError> {
        Ok(Self::new(HttpReportSource::new(config)?))
    }
}

impl<S: ReportSource> ReportController<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: ViewState::Idle,
            info: ReportInfo::default(),
            dataset: Dataset::default(),
            displayed: Vec::new(),
            term: String::new(),
            notice: None,
        }
    }

    /// Load the report for `raw_id`. Runs once per controller.
    pub async fn initialize(&mut self, raw_id: &str) {
        if self.state != ViewState::Idle {
            tracing::warn!(source_id = raw_id, "Report view already initialized; ignoring");
            return;
        }

        let source_id = match parse_source_id(raw_id) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(source_id = raw_id, "Rejected report id");
                self.state = ViewState::Failed(e);
                return;
            }
        };

        self.state = ViewState::Loading {
            source_id: source_id.clone(),
        };

        let response = match self.source.fetch_report(&source_id).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(source_id = %source_id, error = %e, "Report fetch failed");
                self.state = ViewState::Failed(fetch_error(&source_id, None));
                return;
            }
        };

        let body: Option<Value> = serde_json::from_str(&response.body).ok();

        if !response.is_success() {
            let message = body.as_ref().and_then(server_message);
            tracing::error!(
                source_id = %source_id,
                status = response.status,
                "Report endpoint returned an error"
            );
            self.state = ViewState::Failed(fetch_error(&source_id, message));
            return;
        }

        let report = match body.map(serde_json::from_value::<Report>) {
            Some(Ok(report)) => report,
            Some(Err(e)) => {
                tracing::error!(source_id = %source_id, error = %e, "Malformed report body");
                self.state = ViewState::Failed(fetch_error(&source_id, None));
                return;
            }
            None => {
                tracing::error!(source_id = %source_id, "Report body is not JSON");
                self.state = ViewState::Failed(fetch_error(&source_id, None));
                return;
            }
        };

        let (info, dataset) = report.into_dataset();
        self.info = info;

        match dataset {
            Ok(dataset) => {
                tracing::info!(
                    source_id = %source_id,
                    rows = dataset.len(),
                    columns = dataset.columns.len(),
                    "Report loaded"
                );
                self.displayed = (0..dataset.len()).collect();
                self.dataset = dataset;
                self.state = ViewState::Ready;
            }
            Err(ReportError::EmptyOrMalformedReport { display_name, raw }) => {
                tracing::warn!(source_id = %source_id, "Report has no usable rows");
                self.state = ViewState::NoData(NoDataPanel {
                    title: format!("Error or Raw Data for {}", display_name),
                    raw,
                });
            }
            Err(other) => self.state = ViewState::Failed(other),
        }
    }

    /// Load the report named by the last segment of a view URL path.
    pub async fn initialize_from_path(&mut self, path: &str) {
        let id = source_id_from_path(path).to_string();
        self.initialize(&id).await;
    }

    /// Re-derive the displayed subset from the canonical dataset.
    pub fn on_search_input(&mut self, raw_term: &str) {
        if self.state != ViewState::Ready {
            return;
        }
        self.term = normalize_term(raw_term);
        self.displayed = filter_indices(&self.dataset.rows, &self.dataset.columns, &self.term);
        tracing::debug!(
            term = %self.term,
            shown = self.displayed.len(),
            total = self.dataset.len(),
            "Filter applied"
        );
    }

    /// CSV of the displayed subset, or `None` with a warning notice when
    /// there is nothing to export.
    pub fn on_export_request(&mut self) -> Option<CsvExport> {
        if !self.export_enabled() {
            tracing::warn!("Export requested with no rows displayed");
            self.notice = Some(Notice {
                level: NoticeLevel::Warning,
                text: ReportError::ExportWithNoData.to_string(),
            });
            return None;
        }

        let export = CsvExport::build(
            &self.info.display_name,
            self.displayed_rows(),
            &self.dataset.columns,
        );
        tracing::info!(
            filename = %export.filename,
            rows = self.displayed.len(),
            "CSV export built"
        );
        Some(export)
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn info(&self) -> &ReportInfo {
        &self.info
    }

    pub fn columns(&self) -> &[String] {
        &self.dataset.columns
    }

    /// Normalized term the displayed subset was derived from.
    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn canonical_rows(&self) -> &[Row] {
        &self.dataset.rows
    }

    pub fn displayed_indices(&self) -> &[usize] {
        &self.displayed
    }

    pub fn displayed_rows(&self) -> impl Iterator<Item = &Row> + '_ {
        self.displayed.iter().map(move |&i| &self.dataset.rows[i])
    }

    pub fn displayed_len(&self) -> usize {
        self.displayed.len()
    }

    /// Fresh table for the displayed subset.
    pub fn table_view(&self) -> TableView {
        render_table(self.displayed_rows(), &self.dataset.columns)
    }

    pub fn search_enabled(&self) -> bool {
        self.state == ViewState::Ready
    }

    pub fn export_enabled(&self) -> bool {
        self.state == ViewState::Ready && !self.displayed.is_empty()
    }

    /// A non-empty search that matched nothing.
    pub fn no_results(&self) -> bool {
        self.state == ViewState::Ready && !self.term.is_empty() && self.displayed.is_empty()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }
}

/// Validate a report id: non-empty ASCII digits, surrounding whitespace ignored.
pub fn parse_source_id(raw: &str) -> Result<String, ReportError> {
    let id = raw.trim();
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ReportError::InvalidSourceId(raw.to_string()));
    }
    Ok(id.to_string())
}

/// Last `/`-separated segment of a URL path.
pub fn source_id_from_path(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or_default()
}

fn fetch_error(source_id: &str, message: Option<String>) -> ReportError {
    ReportError::ReportFetch {
        source_id: source_id.to_string(),
        message: message
            .unwrap_or_else(|| format!("Failed to load report data for ID: {}.", source_id)),
    }
}

/// Server-provided reason: `error` first, then `message`.
fn server_message(body: &Value) -> Option<String> {
    ["error", "message"].iter().find_map(|key| {
        body.get(*key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(String::from)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn source_ids_must_be_digits() {
        assert_eq!(parse_source_id("42").unwrap(), "42");
        assert_eq!(parse_source_id(" 7 ").unwrap(), "7");
        for bad in ["", "   ", "abc", "12a", "-1", "1.5"] {
            assert_eq!(
                parse_source_id(bad),
                Err(ReportError::InvalidSourceId(bad.to_string())),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn path_segment_extraction() {
        assert_eq!(source_id_from_path("/view_log_table/12"), "12");
        assert_eq!(source_id_from_path("/view_log_table/12/"), "");
        assert_eq!(source_id_from_path("12"), "12");
    }

    #[test]
    fn server_message_prefers_error_then_message() {
        assert_eq!(
            server_message(&json!({"error": "boom", "message": "m"})),
            Some("boom".to_string())
        );
        assert_eq!(
            server_message(&json!({"error": "", "message": "m"})),
            Some("m".to_string())
        );
        assert_eq!(server_message(&json!({"detail": "x"})), None);
    }

    #[test]
    fn fetch_error_falls_back_to_generic_text() {
        assert_eq!(
            fetch_error("9", None).to_string(),
            "Error loading report (ID: 9): Failed to load report data for ID: 9."
        );
    }
}
