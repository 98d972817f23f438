//! Per-session register of medications added by the user.
//!
//! The register is an overlay on top of the reference table: entries are only
//! ever appended, and the base table is never touched. Callers own the
//! register's lifetime and pass it (with the base table) into every operation
//! that needs the merged view.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{MedicationRecord, ReferenceTable};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("Medication name is required")]
    EmptyName,
    #[error("Medication '{0}' already exists")]
    DuplicateName(String),
}

/// Ad-hoc medications added during one session, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdHocRegister {
    entries: Vec<MedicationRecord>,
}

impl AdHocRegister {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Add a medication with its name trimmed.
    ///
    /// Rejects blank names and names already present in `base` or in this
    /// register (exact, case-sensitive). On rejection the register is left as
    /// it was. Returns the merged list of names on success.
    pub fn add(
        &mut self,
        base: &ReferenceTable,
        mut record: MedicationRecord,
    ) -> Result<Vec<String>, RegisterError> {
        let name = record.drug_name.trim().to_string();
        if name.is_empty() {
            return Err(RegisterError::EmptyName);
        }
        if base.contains(&name) || self.entries.iter().any(|e| e.drug_name == name) {
            return Err(RegisterError::DuplicateName(name));
        }
        record.drug_name = name;
        self.entries.push(record);
        Ok(self.merge(base).names())
    }

    /// Base rows followed by register rows.
    ///
    /// When a name appears in both, the base row is kept.
    pub fn merge(&self, base: &ReferenceTable) -> ReferenceTable {
        ReferenceTable::from_records(
            base.records().iter().cloned().chain(self.entries.iter().cloned()),
        )
    }

    pub fn entries(&self) -> &[MedicationRecord] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry; called when the session ends.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
