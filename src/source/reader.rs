//! CSV reader for the action-step table.
//!
//! Columns are located by header name, so their order in the file does not
//! matter. Every required header must be present; otherwise nothing is loaded.

use crate::error::SourceLoadError;
use crate::models::ActionStepRecord;
use csv::{ReaderBuilder, StringRecord};
use std::io::Read;
use std::path::Path;
use tracing::debug;

pub const DISTRICT_COLUMN: &str = "UIP: District Name";
pub const STEP_COLUMN: &str = "Improvement Action Step";
pub const DESCRIPTION_COLUMN: &str = "Description of Action Step";
pub const START_COLUMN: &str = "Start Date";
pub const TARGET_COLUMN: &str = "Target Date";
pub const STRATEGY_COLUMN: &str = "Major Improvement Strategy";
pub const RESOURCES_COLUMN: &str = "Resources";

/// Headers that must appear in the source table.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    DISTRICT_COLUMN,
    STEP_COLUMN,
    DESCRIPTION_COLUMN,
    START_COLUMN,
    TARGET_COLUMN,
    STRATEGY_COLUMN,
    RESOURCES_COLUMN,
];

/// Positions of the required columns within a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnIndex {
    district: usize,
    step: usize,
    description: usize,
    start: usize,
    target: usize,
    strategy: usize,
    resources: usize,
}

impl ColumnIndex {
    /// Resolve every required column, collecting all missing names.
    fn resolve(headers: &StringRecord) -> Result<Self, Vec<String>> {
        let names: Vec<&str> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| if i == 0 { h.trim_start_matches('\u{feff}') } else { h })
            .collect();

        let find = |column: &str| names.iter().position(|h| *h == column);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|column| find(**column).is_none())
            .map(|column| column.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(missing);
        }

        let at = |column: &str| find(column).unwrap_or_default();
        Ok(Self {
            district: at(DISTRICT_COLUMN),
            step: at(STEP_COLUMN),
            description: at(DESCRIPTION_COLUMN),
            start: at(START_COLUMN),
            target: at(TARGET_COLUMN),
            strategy: at(STRATEGY_COLUMN),
            resources: at(RESOURCES_COLUMN),
        })
    }

    fn record(&self, row: &StringRecord) -> ActionStepRecord {
        let field = |idx: usize| row.get(idx).unwrap_or_default().to_string();
        ActionStepRecord {
            district: field(self.district),
            step: field(self.step),
            description: field(self.description),
            start: field(self.start),
            target: field(self.target),
            strategy: field(self.strategy),
            resources: field(self.resources),
        }
    }
}

/// Read every record from a CSV file on disk.
pub fn read_action_steps(path: &Path) -> Result<Vec<ActionStepRecord>, SourceLoadError> {
    let reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|source| SourceLoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    read_records(reader, path)
}

/// Read every record from an arbitrary CSV stream.
///
/// `origin` is only used to label errors.
#[cfg(test)]
pub fn read_action_steps_from<R: Read>(
    input: R,
    origin: &Path,
) -> Result<Vec<ActionStepRecord>, SourceLoadError> {
    let reader = ReaderBuilder::new().has_headers(true).from_reader(input);
    read_records(reader, origin)
}

fn read_records<R: Read>(
    mut reader: csv::Reader<R>,
    origin: &Path,
) -> Result<Vec<ActionStepRecord>, SourceLoadError> {
    let headers = reader
        .headers()
        .map_err(|source| SourceLoadError::Headers {
            path: origin.to_path_buf(),
            source,
        })?
        .clone();

    let columns =
        ColumnIndex::resolve(&headers).map_err(|missing| SourceLoadError::MissingColumns {
            path: origin.to_path_buf(),
            missing,
        })?;
    debug!("Resolved columns: {:?}", columns);

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|source| SourceLoadError::MalformedRow {
            path: origin.to_path_buf(),
            line: source.position().map(|p| p.line()).unwrap_or_default(),
            source,
        })?;
        records.push(columns.record(&row));
    }

    Ok(records)
}
