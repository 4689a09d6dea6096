//! CSV serialization of a row set.

use std::borrow::Cow;

use crate::table::humanize_header;
use crate::types::{cell_text, Row};

/// Quote a field iff it contains a comma, a double quote or a line break
/// (`\n` or `\r`).
pub fn escape_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Serialize rows as CSV: humanized header line first, then one line per
/// row with fields in column order. Every line ends with `\n`.
pub fn serialize_csv<'a, I>(rows: I, columns: &[String]) -> String
where
    I: IntoIterator<Item = &'a Row>,
{
    let header = columns
        .iter()
        .map(|c| escape_field(&humanize_header(c)).into_owned())
        .collect::<Vec<_>>()
        .join(",");

    let mut csv = header;
    csv.push('\n');

    for row in rows {
        let line = columns
            .iter()
            .map(|key| escape_field(&cell_text(row.get(key))).into_owned())
            .collect::<Vec<_>>()
            .join(",");
        csv.push_str(&line);
        csv.push('\n');
    }

    csv
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_fields_are_untouched() {
        assert_eq!(escape_field("plain text"), "plain text");
        assert_eq!(escape_field(""), "");
    }

    #[test]
    fn special_fields_are_quoted() {
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("line1\nline2"), "\"line1\nline2\"");
    }

    #[test]
    fn carriage_returns_are_quoted() {
        assert_eq!(escape_field("a\rb"), "\"a\rb\"");
        assert_eq!(escape_field("a\r\nb"), "\"a\r\nb\"");
    }

    #[test]
    fn no_rows_yields_header_only() {
        let cols = vec!["run_time".to_string(), "bot".to_string()];
        assert_eq!(serialize_csv(std::iter::empty(), &cols), "Run time,Bot\n");
    }
}
