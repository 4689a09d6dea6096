//! botdash report engine - types and pure transformations
//!
//! Holds the tabular report model and the three stateless stages the report
//! view is built from: filtering, table rendering and CSV serialization.

pub mod csv;
pub mod error;
pub mod export;
pub mod filter;
pub mod table;
pub mod types;

pub use csv::{escape_field, serialize_csv};
pub use error::*;
pub use export::{sanitize_report_name, CsvExport, CSV_MIME, EXPORT_SUFFIX};
pub use filter::{filter_indices, filter_rows, normalize_term, row_matches};
pub use table::{humanize_header, render_table, BodyCell, StatusTag, TableView, NO_ENTRIES_TEXT};
pub use types::*;
