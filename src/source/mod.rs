//! Loading of the action-step table.

pub mod reader;

use crate::error::SourceLoadError;
use crate::models::ActionStepRecord;
use std::path::{Path, PathBuf};
use tracing::info;

/// Ordered, immutable collection of records loaded for one run.
#[derive(Debug, Clone)]
pub struct RecordStore {
    source: PathBuf,
    records: Vec<ActionStepRecord>,
}

impl RecordStore {
    /// Load every record from the CSV file at `path`.
    pub fn load(path: &Path) -> Result<Self, SourceLoadError> {
        let records = reader::read_action_steps(path)?;
        info!("Loaded {} action steps from {}", records.len(), path.display());
        Ok(Self::from_records(path.to_path_buf(), records))
    }

    pub fn from_records(source: PathBuf, records: Vec<ActionStepRecord>) -> Self {
        Self { source, records }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn records(&self) -> &[ActionStepRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
