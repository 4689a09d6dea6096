use thiserror::Error;

/// Failures a report view can end up in.
///
/// Every variant is caught at the controller boundary and turned into a
/// rendered state; none of them is fatal to the hosting process.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("Invalid report ID: '{0}'")]
    InvalidSourceId(String),

    #[error("Error loading report (ID: {source_id}): {message}")]
    ReportFetch { source_id: String, message: String },

    #[error("Report data for {display_name} could not be retrieved or was empty")]
    EmptyOrMalformedReport { display_name: String, raw: String },

    #[error("No logs to download.")]
    ExportWithNoData,
}

impl ReportError {
    /// Terminal errors end the load attempt; the view shows a static panel.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::InvalidSourceId(_) | Self::ReportFetch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_load_failures_are_terminal() {
        assert!(ReportError::InvalidSourceId("x".into()).is_terminal());
        assert!(ReportError::ReportFetch {
            source_id: "1".into(),
            message: "down".into(),
        }
        .is_terminal());
        assert!(!ReportError::ExportWithNoData.is_terminal());
        assert!(!ReportError::EmptyOrMalformedReport {
            display_name: "R".into(),
            raw: String::new(),
        }
        .is_terminal());
    }
}
