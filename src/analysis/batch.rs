//! Conversion of district groups into batch documents.

use crate::models::{ActionStepAttributes, DistrictBatch, DistrictGroup};

impl From<&DistrictGroup<'_>> for DistrictBatch {
    fn from(group: &DistrictGroup<'_>) -> Self {
        Self {
            district_name: group.district.to_string(),
            action_steps: group
                .records
                .iter()
                .map(|record| ActionStepAttributes::from(*record))
                .collect(),
        }
    }
}

/// Build one batch per district group, keeping group order.
pub fn build_batches(groups: &[DistrictGroup<'_>]) -> Vec<DistrictBatch> {
    groups.iter().map(DistrictBatch::from).collect()
}

impl DistrictBatch {
    /// Render the batch document embedded in the analysis prompt.
    pub fn to_document(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
