//! Search filter over the canonical dataset.
//!
//! A row is kept when any listed column contains the term, compared
//! case-insensitively as a plain substring. Filtering always runs against
//! the full row set so successive searches never compound.

use crate::types::{cell_text, Row};

/// Trim and lowercase raw search input.
pub fn normalize_term(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Whether `row` matches an already-normalized `term`.
pub fn row_matches(row: &Row, columns: &[String], term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    columns
        .iter()
        .any(|key| cell_text(row.get(key)).to_lowercase().contains(term))
}

/// Indices of the matching rows, in original order.
pub fn filter_indices(rows: &[Row], columns: &[String], term: &str) -> Vec<usize> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| row_matches(row, columns, term))
        .map(|(idx, _)| idx)
        .collect()
}

/// Matching rows by reference, in original order.
pub fn filter_rows<'a>(rows: &'a [Row], columns: &[String], term: &str) -> Vec<&'a Row> {
    rows.iter()
        .filter(|row| row_matches(row, columns, term))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows() -> Vec<Row> {
        vec![
            json!({"name": "alpha", "status": "SUCCESS"}),
            json!({"name": "beta", "status": "FAILED", "hidden": "alpha"}),
            json!({"name": null, "status": "Warning: slow"}),
        ]
        .into_iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect()
    }

    fn cols() -> Vec<String> {
        vec!["name".into(), "status".into()]
    }

    #[test]
    fn normalize_trims_and_folds() {
        assert_eq!(normalize_term("  FaIl \n"), "fail");
        assert_eq!(normalize_term("   "), "");
    }

    #[test]
    fn empty_term_keeps_everything() {
        assert_eq!(filter_indices(&rows(), &cols(), ""), vec![0, 1, 2]);
    }

    #[test]
    fn columns_outside_the_list_are_not_searched() {
        assert_eq!(filter_indices(&rows(), &cols(), "alpha"), vec![0]);
    }

    #[test]
    fn null_cells_never_match_text() {
        assert_eq!(filter_indices(&rows(), &cols(), "null"), Vec::<usize>::new());
    }

    #[test]
    fn filter_rows_returns_references_into_the_source() {
        let data = rows();
        let hits = filter_rows(&data, &cols(), "a");
        assert_eq!(hits.len(), 3);
        assert!(std::ptr::eq(hits[1], &data[1]));
    }
}
