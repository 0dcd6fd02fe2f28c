//! Data models for the district analysis pipeline.
//!
//! This module contains the records read from the source table, the
//! per-district groups and batches derived from them, and the results
//! produced by the generation stages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One row of the action-step table.
///
/// Dates are kept as the raw cell text; no field is trimmed or validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionStepRecord {
    pub district: String,
    pub step: String,
    pub description: String,
    pub start: String,
    pub target: String,
    pub strategy: String,
    pub resources: String,
}

/// Order in which districts are handed to the analyzer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum DistrictOrder {
    /// Order of first appearance in the source table (default)
    #[default]
    FirstSeen,
    /// Lexicographic order of the district name
    Alphabetical,
}

impl fmt::Display for DistrictOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistrictOrder::FirstSeen => write!(f, "first-seen"),
            DistrictOrder::Alphabetical => write!(f, "alphabetical"),
        }
    }
}

/// All records sharing one district name, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistrictGroup<'a> {
    pub district: &'a str,
    pub records: Vec<&'a ActionStepRecord>,
}

impl<'a> DistrictGroup<'a> {
    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// The attributes of one action step as embedded in a batch document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionStepAttributes {
    pub step: String,
    pub description: String,
    pub start: String,
    pub target: String,
    pub strategy: String,
    pub resources: String,
}

impl From<&ActionStepRecord> for ActionStepAttributes {
    fn from(record: &ActionStepRecord) -> Self {
        Self {
            step: record.step.clone(),
            description: record.description.clone(),
            start: record.start.clone(),
            target: record.target.clone(),
            strategy: record.strategy.clone(),
            resources: record.resources.clone(),
        }
    }
}

/// Serializable per-district payload handed to the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistrictBatch {
    pub district_name: String,
    pub action_steps: Vec<ActionStepAttributes>,
}

/// Generated analysis text for one district.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub district: String,
    pub text: String,
}

/// A district that was skipped because its analysis failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistrictFailure {
    pub district: String,
    pub error: String,
}

/// The synthesized cross-district report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalReport {
    pub text: String,
}

/// Metadata about one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Path of the action-step table.
    pub source_path: PathBuf,
    /// Name of the model used for generation.
    pub model_used: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Number of records loaded from the source.
    pub records_loaded: usize,
    /// Number of districts found.
    pub districts_total: usize,
    /// Number of districts whose analysis succeeded.
    pub districts_analyzed: usize,
    /// Districts skipped because their analysis failed.
    pub failed_districts: Vec<DistrictFailure>,
    /// Where the report was written, if publishing succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    /// Wall-clock duration of the run in seconds.
    pub duration_seconds: f64,
}

impl RunSummary {
    /// Creates an empty summary for a run that is about to start.
    pub fn new(source_path: PathBuf, model_used: String) -> Self {
        Self {
            source_path,
            model_used,
            started_at: Utc::now(),
            records_loaded: 0,
            districts_total: 0,
            districts_analyzed: 0,
            failed_districts: Vec::new(),
            output_path: None,
            duration_seconds: 0.0,
        }
    }

    pub fn districts_failed(&self) -> usize {
        self.failed_districts.len()
    }
}
