//! Writing the synthesized report to disk.

use crate::error::PublishError;
use crate::models::FinalReport;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

/// Writes the final report verbatim to a fixed path.
#[derive(Debug, Clone)]
pub struct ReportPublisher {
    path: PathBuf,
}

impl ReportPublisher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the report text.
    ///
    /// The text is staged in a temporary file next to the target and then
    /// renamed over it, so a failed write leaves any previous file intact.
    pub fn publish(&self, report: &FinalReport) -> Result<(), PublishError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let wrap = |source: std::io::Error| PublishError {
            path: self.path.clone(),
            source,
        };

        let mut staged = NamedTempFile::new_in(dir).map_err(wrap)?;
        staged.write_all(report.text.as_bytes()).map_err(wrap)?;
        staged.flush().map_err(wrap)?;
        staged
            .persist(&self.path)
            .map_err(|e| wrap(e.error))?;

        info!(
            "Wrote {} byte report to {}",
            report.text.len(),
            self.path.display()
        );
        Ok(())
    }
}
