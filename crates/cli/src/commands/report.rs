use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::ValueEnum;
use crushcheck_core::model::{missing_fields, PatientContext};
use crushcheck_core::report::{render_docx, render_pdf, Locale, ReportArtifact, ReportContent};
use crushcheck_core::selection::resolve;
use serde::Deserialize;

use crate::canonicalize_or_current;
use crate::commands::{load_merged, open_context};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Docx,
    Pdf,
    Both,
}

impl ReportFormat {
    fn wants_docx(self) -> bool {
        matches!(self, ReportFormat::Docx | ReportFormat::Both)
    }

    fn wants_pdf(self) -> bool {
        matches!(self, ReportFormat::Pdf | ReportFormat::Both)
    }
}

/// Patient and selection read from a YAML or JSON request file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportRequest {
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub facility: Option<String>,
    #[serde(default)]
    pub medications: Vec<String>,
}

/// Parse a request file; `.json` is read as JSON, anything else as YAML.
pub fn load_request(path: &Path) -> Result<ReportRequest> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file: {}", path.display()))?;
    let is_json =
        path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let request = if is_json {
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse request JSON: {}", path.display()))?
    } else {
        serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse request YAML: {}", path.display()))?
    };
    Ok(request)
}

/// Everything the `report` subcommand accepts.
#[derive(Debug, Clone)]
pub struct ReportArgs {
    pub root: String,
    pub patient_name: Option<String>,
    pub dob: Option<String>,
    pub facility: Option<String>,
    pub drugs: Vec<String>,
    pub format: ReportFormat,
    pub out_dir: Option<String>,
    pub locale: Option<Locale>,
    pub signatures: bool,
    pub request: Option<String>,
    pub reference: Option<String>,
}

impl ReportArgs {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            patient_name: None,
            dob: None,
            facility: None,
            drugs: Vec::new(),
            format: ReportFormat::Both,
            out_dir: None,
            locale: None,
            signatures: false,
            request: None,
            reference: None,
        }
    }
}

/// Accepts ISO dates (`1980-01-01`) and day-first dates (`01/01/1980`).
pub fn parse_date_of_birth(text: &str) -> Result<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%d/%m/%Y"))
        .map_err(|_| anyhow!("Invalid date of birth '{text}'; expected YYYY-MM-DD"))
}

/// Selection with repeats removed, first occurrence kept.
fn unique_selection(drugs: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(drugs.len());
    for drug in drugs {
        if !out.contains(&drug) {
            out.push(drug);
        }
    }
    out
}

/// Render the requested formats and write them to the output directory.
///
/// Blank required fields stop the command before anything is resolved or
/// written, and every artifact is rendered before the first file is written,
/// so a failed run never leaves a partial report behind.
pub fn report_command(args: &ReportArgs) -> Result<Vec<PathBuf>> {
    let request = match &args.request {
        Some(path) => load_request(&canonicalize_or_current(path)?)?,
        None => ReportRequest::default(),
    };

    let patient_name = args.patient_name.clone().or(request.patient_name).unwrap_or_default();
    let dob_text = args.dob.clone().or(request.date_of_birth).unwrap_or_default();
    let facility = args.facility.clone().or(request.facility);
    let drugs = if args.drugs.is_empty() { request.medications } else { args.drugs.clone() };
    let drugs = unique_selection(drugs);

    let missing = missing_fields(&patient_name, &dob_text, &drugs);
    if !missing.is_empty() {
        bail!("Missing required fields: {}", missing.join(", "));
    }
    let date_of_birth = parse_date_of_birth(&dob_text)?;

    let mut ctx = open_context(&args.root, args.reference.as_deref())?;
    let view = load_merged(&mut ctx)?;
    let records = resolve(&drugs, &view.merged).context("Failed to resolve selection")?;

    let patient = PatientContext::new(patient_name.trim(), date_of_birth)
        .with_facility(facility.or_else(|| ctx.config.facility.clone()));
    let content = ReportContent::new(patient, records, Local::now().naive_local());

    let mut options = ctx.report_options()?;
    if let Some(locale) = args.locale {
        options.locale = locale;
    }
    options.signature_lines |= args.signatures;

    let mut artifacts: Vec<ReportArtifact> = Vec::new();
    if args.format.wants_docx() {
        artifacts.push(render_docx(&content, &options).context("Failed to render Word report")?);
    }
    if args.format.wants_pdf() {
        artifacts.push(render_pdf(&content, &options).context("Failed to render PDF report")?);
    }

    let out_dir = match &args.out_dir {
        Some(dir) => canonicalize_or_current(dir)?,
        None => ctx.layout.reports_dir.clone(),
    };
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;

    let mut written = Vec::new();
    for artifact in &artifacts {
        let path = out_dir.join(&artifact.file_name);
        fs::write(&path, &artifact.bytes)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        tracing::info!(path = %path.display(), mime = artifact.mime_type, "wrote report");
        println!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}
