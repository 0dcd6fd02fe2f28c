//! Error types for the district analysis pipeline.
//!
//! Each stage has its own error type so callers can decide whether a
//! failure aborts the run or only skips one district.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to load the action-step table. Always fatal.
#[derive(Debug, Error)]
pub enum SourceLoadError {
    /// The file could not be opened or read.
    #[error("failed to open source file {}: {}", .path.display(), .source)]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The header row could not be read.
    #[error("failed to read header row of {}: {}", .path.display(), .source)]
    Headers {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// One or more required columns are absent from the header row.
    #[error("{} is missing required column(s): {}", .path.display(), .missing.join(", "))]
    MissingColumns { path: PathBuf, missing: Vec<String> },

    /// A data row could not be parsed.
    #[error("malformed row in {} at line {}: {}", .path.display(), .line, .source)]
    MalformedRow {
        path: PathBuf,
        line: u64,
        #[source]
        source: csv::Error,
    },
}

/// Failure reported by a text generation backend.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("cannot connect to generation service at {url}")]
    Connect { url: String },

    #[error("request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("generation service error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to send request: {0}")]
    Request(String),

    #[error("invalid response from generation service: {0}")]
    InvalidResponse(String),
}

/// Failure while analyzing a single district. Recovered by skipping it.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("failed to serialize batch for district '{district}': {source}")]
    Serialization {
        district: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("analysis failed for district '{district}': {source}")]
    Generation {
        district: String,
        #[source]
        source: GenerationError,
    },
}

/// Failure to write the final report.
#[derive(Debug, Error)]
#[error("failed to write report to {}: {}", .path.display(), .source)]
pub struct PublishError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Run-level failures that stop the pipeline before a report exists.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    SourceLoad(#[from] SourceLoadError),

    #[error("report synthesis failed: {0}")]
    Synthesis(#[source] GenerationError),
}
