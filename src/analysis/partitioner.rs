//! Grouping of action steps by district.

use crate::models::{ActionStepRecord, DistrictGroup, DistrictOrder};
use std::collections::HashMap;

/// Group records by exact district name.
///
/// Records keep their source order within each group. Groups are returned in
/// first-seen order unless `order` asks for alphabetical. Names that differ
/// only in case or surrounding whitespace form separate groups.
pub fn partition_by_district(
    records: &[ActionStepRecord],
    order: DistrictOrder,
) -> Vec<DistrictGroup<'_>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<DistrictGroup<'_>> = Vec::new();

    for record in records {
        let slot = *index.entry(record.district.as_str()).or_insert_with(|| {
            groups.push(DistrictGroup {
                district: record.district.as_str(),
                records: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].records.push(record);
    }

    if order == DistrictOrder::Alphabetical {
        groups.sort_by(|a, b| a.district.cmp(b.district));
    }

    groups
}
