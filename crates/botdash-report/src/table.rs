//! Presentational table structure for a row set.

use std::fmt::Write as _;

use crate::types::{cell_text, Row};

/// Placeholder text shown instead of an empty table shell.
pub const NO_ENTRIES_TEXT: &str = "No structured log entries found.";

/// Cosmetic status emphasis derived from a cell's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTag {
    Success,
    Error,
    Warning,
}

impl StatusTag {
    /// Classify cell text. `success` wins over `error`/`fail`, which win over `warning`.
    pub fn classify(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        if lower.contains("success") {
            Some(Self::Success)
        } else if lower.contains("error") || lower.contains("fail") {
            Some(Self::Error)
        } else if lower.contains("warning") {
            Some(Self::Warning)
        } else {
            None
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Self::Success => "status-success",
            Self::Error => "status-error",
            Self::Warning => "status-warning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyCell {
    pub text: String,
    pub status: Option<StatusTag>,
}

/// Output of the table renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableView {
    /// No rows to show.
    Placeholder(&'static str),
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<BodyCell>>,
    },
}

/// Header label for a column key: leading character uppercased, later
/// underscores turned into spaces. Applying it twice changes nothing.
pub fn humanize_header(header: &str) -> String {
    let mut chars = header.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => {
            let mut out: String = first.to_uppercase().collect();
            out.push_str(&chars.as_str().replace('_', " "));
            out
        }
    }
}

/// Render rows into a [`TableView`], one cell per listed column.
///
/// Keys missing from a row render empty; keys outside `columns` are ignored.
pub fn render_table<'a, I>(rows: I, columns: &[String]) -> TableView
where
    I: IntoIterator<Item = &'a Row>,
{
    let body: Vec<Vec<BodyCell>> = rows
        .into_iter()
        .map(|row| {
            columns
                .iter()
                .map(|key| {
                    let text = cell_text(row.get(key)).into_owned();
                    let status = StatusTag::classify(&text);
                    BodyCell { text, status }
                })
                .collect()
        })
        .collect();

    if body.is_empty() {
        return TableView::Placeholder(NO_ENTRIES_TEXT);
    }

    TableView::Table {
        headers: columns.iter().map(|c| humanize_header(c)).collect(),
        rows: body,
    }
}

impl TableView {
    pub fn row_count(&self) -> usize {
        match self {
            Self::Placeholder(_) => 0,
            Self::Table { rows, .. } => rows.len(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }

    /// HTML fragment for the web view. All text is escaped.
    pub fn to_html(&self) -> String {
        let (headers, rows) = match self {
            Self::Placeholder(text) => {
                return format!("<p class=\"placeholder\">{}</p>", html_escape(text));
            }
            Self::Table { headers, rows } => (headers, rows),
        };

        let mut html =
            String::from("<div class=\"table-wrap\">\n<table class=\"report-table\">\n<thead><tr>");
        for header in headers {
            let _ = write!(html, "<th>{}</th>", html_escape(header));
        }
        html.push_str("</tr></thead>\n<tbody>\n");
        for row in rows {
            html.push_str("<tr>");
            for cell in row {
                let text = html_escape(&cell.text);
                match cell.status {
                    Some(tag) => {
                        let _ = write!(
                            html,
                            "<td><span class=\"{}\">{}</span></td>",
                            tag.css_class(),
                            text
                        );
                    }
                    None => {
                        let _ = write!(html, "<td>{}</td>", text);
                    }
                }
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</tbody>\n</table>\n</div>");
        html
    }
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
