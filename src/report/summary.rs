//! Run summary rendering.

use crate::models::RunSummary;
use anyhow::{Context, Result};
use std::path::Path;

/// Render the console summary printed at the end of a run.
pub fn generate_summary_text(summary: &RunSummary) -> String {
    let mut lines = Vec::new();

    lines.push(format!("   Source: {}", summary.source_path.display()));
    lines.push(format!("   Model: {}", summary.model_used));
    lines.push(format!("   Action steps: {}", summary.records_loaded));
    lines.push(format!("   Districts: {}", summary.districts_total));
    lines.push(format!("   - ✅ Analyzed: {}", summary.districts_analyzed));
    lines.push(format!("   - ⚠️  Skipped: {}", summary.districts_failed()));

    for failure in &summary.failed_districts {
        lines.push(format!("       {}: {}", failure.district, failure.error));
    }

    lines.push(format!("   Duration: {:.1}s", summary.duration_seconds));
    lines.join("\n")
}

/// Write the run summary as pretty JSON.
pub fn write_summary_json(summary: &RunSummary, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(summary).context("Failed to serialize run summary")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write run summary to {}", path.display()))
}
