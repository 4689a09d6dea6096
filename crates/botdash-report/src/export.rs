//! Downloadable CSV artifacts.

use serde::Serialize;

use crate::csv::serialize_csv;
use crate::types::Row;

pub const CSV_MIME: &str = "text/csv;charset=utf-8";
pub const EXPORT_SUFFIX: &str = "_filtered.csv";

const MAX_NAME_CHARS: usize = 30;
const FALLBACK_NAME: &str = "log_report";

/// A serialized export ready to be written or served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvExport {
    pub filename: String,
    pub mime: &'static str,
    pub content: String,
}

impl CsvExport {
    /// Serialize `rows` and name the artifact after the report.
    pub fn build<'a, I>(display_name: &str, rows: I, columns: &[String]) -> Self
    where
        I: IntoIterator<Item = &'a Row>,
    {
        Self {
            filename: format!("{}{}", sanitize_report_name(display_name), EXPORT_SUFFIX),
            mime: CSV_MIME,
            content: serialize_csv(rows, columns),
        }
    }
}

/// Filesystem-safe stem for a report name: lowercased, every character
/// outside `[a-z0-9]` replaced by `_`, cut to 30 characters.
pub fn sanitize_report_name(name: &str) -> String {
    let name = if name.is_empty() { FALLBACK_NAME } else { name };
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { '_' })
        .take(MAX_NAME_CHARS)
        .collect()
}
