//! Source/destination partitioning.
//!
//! A record takes part in reconciliation only if it carries the code field.
//! Among those, records without the relation (marker) field are link
//! targets ("sources"); records that have it are the ones to be linked
//! ("destinations").

use crate::models::Record;

/// Result of [`classify`]. Both subsets keep input order.
#[derive(Debug, Default)]
pub struct Classification<'a> {
    pub sources: Vec<&'a Record>,
    pub destinations: Vec<&'a Record>,
    /// Records without the code field. Excluded from both subsets.
    pub skipped: usize,
}

pub fn classify<'a>(
    records: &'a [Record],
    code_field: &str,
    marker_field: &str,
) -> Classification<'a> {
    let mut out = Classification::default();

    for record in records {
        if !record.has_field(code_field) {
            out.skipped += 1;
            continue;
        }
        if record.has_field(marker_field) {
            out.destinations.push(record);
        } else {
            out.sources.push(record);
        }
    }

    out
}
