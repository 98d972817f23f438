//! Report rendering.
//!
//! One shared content model (`ReportContent`) feeds two renderers:
//! - `render_docx`: a Word document with a flowing four-column table.
//! - `render_pdf`: a paginated PDF with fixed-width cells, where every string
//!   is folded to ASCII first.
//!
//! Renderers are pure: they return the artifact bytes and never touch the
//! filesystem.

mod docx;
mod fold;
mod labels;
mod pdf;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::model::{MedicationRecord, PatientContext};

pub use docx::render_docx;
pub use fold::fold_diacritics;
pub use labels::{Labels, Locale};
pub use pdf::{layout_pdf, render_pdf, FontStyle, PdfLayout, PdfOp};

pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const PDF_MIME: &str = "application/pdf";

/// Credential line printed at the foot of every report.
pub const DEFAULT_ATTRIBUTION: &str =
    "Crush Med Review Tool developed by: Célio Lara Júnior - Pharmacist - PSI 10003245";

const DATE_FORMAT: &str = "%d/%m/%Y";
const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

#[derive(Debug, Error)]
pub enum RenderError {
    /// Rendering was attempted with no medications.
    #[error("Cannot render a report with no medications")]
    EmptyArtifact,

    #[error("Failed to write document XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Failed to package document: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error while rendering: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF error: {0}")]
    Pdf(String),
}

/// Everything printed in a report, shared by both output formats.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportContent {
    pub patient: PatientContext,
    /// Resolved records, in selection order.
    pub records: Vec<MedicationRecord>,
    pub generated_at: NaiveDateTime,
}

impl ReportContent {
    pub fn new(
        patient: PatientContext,
        records: Vec<MedicationRecord>,
        generated_at: NaiveDateTime,
    ) -> Self {
        Self { patient, records, generated_at }
    }

    pub fn date_of_birth_text(&self) -> String {
        self.patient.date_of_birth.format(DATE_FORMAT).to_string()
    }

    pub fn generated_at_text(&self) -> String {
        self.generated_at.format(TIMESTAMP_FORMAT).to_string()
    }

    /// One `[medication, crushable, alternative, recommendation]` row per record.
    pub fn rows(&self) -> Vec<[&str; 4]> {
        self.records
            .iter()
            .map(|r| {
                [
                    r.drug_name.as_str(),
                    r.can_be_crushed.as_str(),
                    r.alternative_form.as_str(),
                    r.recommendation.as_str(),
                ]
            })
            .collect()
    }

    fn ensure_records(&self) -> Result<(), RenderError> {
        if self.records.is_empty() {
            return Err(RenderError::EmptyArtifact);
        }
        Ok(())
    }
}

/// Presentation choices that do not change the report's content.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOptions {
    pub locale: Locale,
    /// Letterhead image (PNG or JPEG) for the Word document.
    pub letterhead: Option<Vec<u8>>,
    /// Print Pharmacist/Nurse/Doctor signature lines under the table.
    pub signature_lines: bool,
    pub attribution: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            locale: Locale::English,
            letterhead: None,
            signature_lines: false,
            attribution: DEFAULT_ATTRIBUTION.to_string(),
        }
    }
}

/// A rendered report ready to hand to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifact {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub file_name: String,
}

/// Suggested file name, e.g. `Crushability_Review_Jane_Doe.pdf`.
///
/// Whitespace, path separators and characters Windows rejects in file names
/// become `_`, so the name is always a single path component.
pub fn report_file_name(patient: &PatientContext, extension: &str) -> String {
    let stem: String = patient
        .name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() || c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("Crushability_Review_{stem}.{extension}")
}
