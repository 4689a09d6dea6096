//! botdash report client
//!
//! The report controller owns the state of one report view: it fetches the
//! report once through a [`ReportSource`], keeps the canonical dataset, and
//! derives the displayed subset, table and CSV export from it.

pub mod config;
pub mod controller;
pub mod source;

pub use config::ClientConfig;
pub use controller::{
    parse_source_id, source_id_from_path, NoDataPanel, Notice, NoticeLevel, ReportController,
    ViewState,
};
pub use source::{HttpReportSource, RawResponse, ReportSource, SourceError};
