//! Resolve a clinician's selection of medication names to records.

use thiserror::Error;

use crate::model::{MedicationRecord, ReferenceTable};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Unknown medication: {0}")]
    UnknownMedication(String),
}

/// Look up each name in `table`, preserving the caller's order.
///
/// Matching is exact and case-sensitive. Repeated names yield repeated
/// records; de-duplicating the selection is the caller's job. The first name
/// with no record fails the whole call.
pub fn resolve<S: AsRef<str>>(
    names: &[S],
    table: &ReferenceTable,
) -> Result<Vec<MedicationRecord>, ResolveError> {
    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            table
                .get(name)
                .cloned()
                .ok_or_else(|| ResolveError::UnknownMedication(name.to_string()))
        })
        .collect()
}
