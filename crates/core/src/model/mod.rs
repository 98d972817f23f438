//! Core data model: medication records, the reference table, and patient details.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of crushability guidance for a single medication.
///
/// `drug_name` is the lookup key and is matched exactly (case-sensitive).
/// The remaining fields are free text carried through to the reports as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationRecord {
    pub drug_name: String,
    /// Usually "Yes", "No" or "Unknown", but the reference data also holds
    /// free-text qualifications.
    pub can_be_crushed: String,
    #[serde(default)]
    pub alternative_form: String,
    #[serde(default)]
    pub recommendation: String,
}

impl MedicationRecord {
    pub fn new(
        drug_name: impl Into<String>,
        can_be_crushed: impl Into<String>,
        alternative_form: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            drug_name: drug_name.into(),
            can_be_crushed: can_be_crushed.into(),
            alternative_form: alternative_form.into(),
            recommendation: recommendation.into(),
        }
    }
}

/// Closed set of crushability flags offered when a user adds a new medication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Crushability {
    Yes,
    No,
    Unknown,
}

impl Crushability {
    /// The flag text stored in `MedicationRecord::can_be_crushed`.
    pub fn as_str(self) -> &'static str {
        match self {
            Crushability::Yes => "Yes",
            Crushability::No => "No",
            Crushability::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Crushability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Crushability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" => Ok(Crushability::Yes),
            "no" => Ok(Crushability::No),
            "unknown" => Ok(Crushability::Unknown),
            other => Err(format!("Invalid crushability '{other}'; expected Yes, No or Unknown")),
        }
    }
}

/// Patient details printed in the report header. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientContext {
    pub name: String,
    pub date_of_birth: NaiveDate,
    /// Nursing home or facility, printed only when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility: Option<String>,
}

impl PatientContext {
    pub fn new(name: impl Into<String>, date_of_birth: NaiveDate) -> Self {
        Self { name: name.into(), date_of_birth, facility: None }
    }

    /// Builder-style helper to attach a facility; blank names are dropped.
    pub fn with_facility(mut self, facility: Option<String>) -> Self {
        self.facility = facility.filter(|f| !f.trim().is_empty());
        self
    }
}

/// Names of the required report inputs that are blank, in form order.
///
/// Renderers trust their input; frontends call this before resolving or
/// rendering so a partial report is never produced.
pub fn missing_fields(
    patient_name: &str,
    date_of_birth: &str,
    selection: &[String],
) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if patient_name.trim().is_empty() {
        missing.push("patient name");
    }
    if date_of_birth.trim().is_empty() {
        missing.push("date of birth");
    }
    if selection.iter().all(|name| name.trim().is_empty()) {
        missing.push("medications");
    }
    missing
}

/// Lookup of medication name to record, in source order.
///
/// Names are unique: when the input repeats a name, the first occurrence wins.
/// Rows whose name is blank are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceTable {
    records: Vec<MedicationRecord>,
    index: HashMap<String, usize>,
}

impl ReferenceTable {
    pub fn from_records(records: impl IntoIterator<Item = MedicationRecord>) -> Self {
        let mut table = Self::default();
        for record in records {
            if record.drug_name.trim().is_empty() || table.index.contains_key(&record.drug_name) {
                continue;
            }
            table.index.insert(record.drug_name.clone(), table.records.len());
            table.records.push(record);
        }
        table
    }

    /// Exact, case-sensitive lookup.
    pub fn get(&self, name: &str) -> Option<&MedicationRecord> {
        self.index.get(name).map(|&i| &self.records[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn records(&self) -> &[MedicationRecord] {
        &self.records
    }

    pub fn names(&self) -> Vec<String> {
        self.records.iter().map(|r| r.drug_name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Case-insensitive substring filter over names, as used by the medication
    /// picker. A blank term matches everything.
    pub fn search(&self, term: &str) -> Vec<&MedicationRecord> {
        let needle = term.trim().to_lowercase();
        self.records
            .iter()
            .filter(|r| needle.is_empty() || r.drug_name.to_lowercase().contains(&needle))
            .collect()
    }
}
