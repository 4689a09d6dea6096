//! Report payload and dataset types.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ReportError;

/// One record of a report, keyed by column name in document order.
pub type Row = serde_json::Map<String, Value>;

/// Prefix the report proxy puts in front of upstream failures it reports as data.
pub const EXTERNAL_ERROR_PREFIX: &str = "External endpoint returned";

/// Shown when a report arrives without any usable rows.
pub const EMPTY_DATA_TEXT: &str = "Report data could not be retrieved or was empty.";

/// A fetched report as served by the show-custom-table endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_source_id: Option<Value>,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub endpoint: String,
    /// Explicit column order. Empty or missing means "use the first row's keys".
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    /// Usually an array of rows; the proxy puts a sentinel string here on upstream failure.
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_name: Option<String>,
}

/// Descriptive part of a report, kept by the view after the data is split off.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportInfo {
    pub display_name: String,
    pub endpoint: String,
    pub bot_name: Option<String>,
}

/// Canonical rows of a report plus the column list derived for them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Report {
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// Split the report into its descriptive part and its dataset.
    ///
    /// Data that is not a non-empty array of objects comes back as
    /// [`ReportError::EmptyOrMalformedReport`] carrying a printable form of
    /// the raw payload.
    pub fn into_dataset(self) -> (ReportInfo, Result<Dataset, ReportError>) {
        let info = ReportInfo {
            display_name: self.display_name,
            endpoint: self.endpoint,
            bot_name: self.bot_name,
        };

        let unusable = |raw: String| ReportError::EmptyOrMalformedReport {
            display_name: info.display_name.clone(),
            raw,
        };

        let dataset = match self.data {
            Value::Array(items) if !items.is_empty() => {
                if items.iter().all(Value::is_object) {
                    let rows: Vec<Row> = items
                        .into_iter()
                        .filter_map(|item| match item {
                            Value::Object(row) => Some(row),
                            _ => None,
                        })
                        .collect();
                    let columns = derive_columns(self.columns.as_deref(), &rows[0]);
                    Ok(Dataset { columns, rows })
                } else {
                    Err(unusable(Value::Array(items).to_string()))
                }
            }
            Value::Array(_) | Value::Null => Err(unusable(EMPTY_DATA_TEXT.to_string())),
            Value::String(text) => Err(unusable(text)),
            other => Err(unusable(other.to_string())),
        };

        (info, dataset)
    }
}

/// Column order for a dataset: the explicit list when it has entries,
/// otherwise the keys of the first row in the order they were sent.
pub fn derive_columns(explicit: Option<&[String]>, first_row: &Row) -> Vec<String> {
    match explicit {
        Some(cols) if !cols.is_empty() => cols.to_vec(),
        _ => first_row.keys().cloned().collect(),
    }
}

/// String form of a cell. Missing and null values read as empty.
///
/// Whole-valued floats print without a fraction (`1.0` reads as `1`), the
/// way a browser stringifies JSON numbers.
pub fn cell_text(value: Option<&Value>) -> Cow<'_, str> {
    match value {
        None | Some(Value::Null) => Cow::Borrowed(""),
        Some(Value::String(s)) => Cow::Borrowed(s.as_str()),
        Some(Value::Bool(true)) => Cow::Borrowed("true"),
        Some(Value::Bool(false)) => Cow::Borrowed("false"),
        Some(Value::Number(n)) => Cow::Owned(number_text(n)),
        Some(other) => Cow::Owned(other.to_string()),
    }
}

// Below 1e21 a whole float has an exact decimal form with no exponent.
const WHOLE_FLOAT_LIMIT: f64 = 1e21;

fn number_text(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f == 0.0 => "0".to_string(),
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < WHOLE_FLOAT_LIMIT => {
            format!("{:.0}", f)
        }
        _ => n.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report(data: Value, columns: Option<Vec<&str>>) -> Report {
        Report {
            display_name: "Nightly Orders".into(),
            endpoint: "http://bot/logs".into(),
            columns: columns.map(|c| c.into_iter().map(String::from).collect()),
            data,
            ..Default::default()
        }
    }

    #[test]
    fn explicit_columns_win_over_first_row_keys() {
        let r = report(json!([{"b": 1, "a": 2}]), Some(vec!["a", "b"]));
        let (_, ds) = r.into_dataset();
        assert_eq!(ds.unwrap().columns, vec!["a", "b"]);
    }

    #[test]
    fn empty_explicit_columns_fall_back_to_document_order() {
        let r = report(json!([{"zeta": 1, "alpha": 2, "mid": 3}]), Some(vec![]));
        let (_, ds) = r.into_dataset();
        assert_eq!(ds.unwrap().columns, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn sentinel_string_is_kept_verbatim() {
        let text = "External endpoint returned HTTP Error 502: Bad Gateway";
        let (info, ds) = report(json!(text), None).into_dataset();
        assert_eq!(info.display_name, "Nightly Orders");
        assert_eq!(
            ds.unwrap_err(),
            ReportError::EmptyOrMalformedReport {
                display_name: "Nightly Orders".into(),
                raw: text.into(),
            }
        );
    }

    #[test]
    fn empty_and_missing_data_use_the_empty_text() {
        for data in [json!([]), Value::Null] {
            let (_, ds) = report(data, None).into_dataset();
            match ds {
                Err(ReportError::EmptyOrMalformedReport { raw, .. }) => {
                    assert_eq!(raw, EMPTY_DATA_TEXT)
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn array_of_scalars_is_malformed() {
        let (_, ds) = report(json!([1, 2]), None).into_dataset();
        match ds {
            Err(ReportError::EmptyOrMalformedReport { raw, .. }) => assert_eq!(raw, "[1,2]"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn cell_text_covers_scalars() {
        assert_eq!(cell_text(None), "");
        assert_eq!(cell_text(Some(&Value::Null)), "");
        assert_eq!(cell_text(Some(&json!("x"))), "x");
        assert_eq!(cell_text(Some(&json!(true))), "true");
        assert_eq!(cell_text(Some(&json!(42))), "42");
        assert_eq!(cell_text(Some(&json!({"k": 1}))), r#"{"k":1}"#);
    }

    #[test]
    fn whole_floats_drop_the_fraction() {
        assert_eq!(cell_text(Some(&json!(1.0))), "1");
        assert_eq!(cell_text(Some(&json!(-3.0))), "-3");
        assert_eq!(cell_text(Some(&json!(-0.0))), "0");
        assert_eq!(cell_text(Some(&json!(1e20))), "100000000000000000000");
        assert_eq!(cell_text(Some(&json!(2.5))), "2.5");
        assert_eq!(cell_text(Some(&json!(u64::MAX))), "18446744073709551615");
    }

    #[test]
    fn rows_are_moved_into_the_dataset_in_order() {
        let r = report(json!([{"n": 1}, {"n": 2}, {"n": 3}]), None);
        let (_, ds) = r.into_dataset();
        let ds = ds.unwrap();
        let ns: Vec<_> = ds.rows.iter().map(|row| row["n"].clone()).collect();
        assert_eq!(ns, vec![json!(1), json!(2), json!(3)]);
        assert_eq!(ds.columns, vec!["n"]);
    }

    #[test]
    fn mixed_array_keeps_every_element_in_the_raw_text() {
        let (_, ds) = report(json!([{"a": 1}, "stray"]), None).into_dataset();
        match ds {
            Err(ReportError::EmptyOrMalformedReport { raw, .. }) => {
                assert_eq!(raw, r#"[{"a":1},"stray"]"#)
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn payload_tolerates_null_columns_and_missing_fields() {
        let r = Report::from_json(r#"{"display_name":"X","columns":null,"data":[{"a":1}]}"#)
            .expect("valid payload");
        assert_eq!(r.columns, None);
        assert_eq!(r.endpoint, "");
        assert!(r.bot_name.is_none());
    }
}
