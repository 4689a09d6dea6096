//! Writing CSV exports to disk for the terminal and CLI adapters.

use std::path::{Path, PathBuf};

use botdash_report::CsvExport;

/// Write `export` into `dir` under its own filename, creating `dir` if needed.
pub fn write_export(dir: &Path, export: &CsvExport) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(&export.filename);
    std::fs::write(&path, export.content.as_bytes())?;
    tracing::info!(path = %path.display(), bytes = export.content.len(), "Export written");
    Ok(path)
}
