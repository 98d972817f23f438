use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use crushcheck_core::model::{MedicationRecord, ReferenceTable};
use crushcheck_core::session::AdHocRegister;
use crushcheck_core::workspace::WorkspaceContext;

use crate::canonicalize_or_current;

/// Open the workspace at `root`, optionally putting an explicit reference file
/// ahead of the configured ones.
pub fn open_context(root: &str, reference: Option<&str>) -> Result<WorkspaceContext> {
    let root_path = canonicalize_or_current(root)?;
    let mut ctx = WorkspaceContext::from_root(&root_path)?;
    if let Some(reference) = reference {
        let path = canonicalize_or_current(reference)?;
        if !path.is_file() {
            return Err(anyhow!("Reference file does not exist: {}", path.display()));
        }
        ctx.prefer_reference_file(&path);
    }
    Ok(ctx)
}

/// Reference table, session register, and their merged view.
pub struct MergedView {
    pub base: Arc<ReferenceTable>,
    pub register: AdHocRegister,
    pub merged: ReferenceTable,
}

pub fn load_merged(ctx: &mut WorkspaceContext) -> Result<MergedView> {
    let base = ctx.load_reference().context(
        "Medication reference unavailable; put Crush_Med_Data_Bank_Clean.xlsx or .csv under \
         data/ or pass --reference",
    )?;
    let register = ctx.load_session()?;
    let merged = register.merge(&base);
    Ok(MergedView { base, register, merged })
}

/// Print records as an aligned four-column text table.
pub fn print_records(records: &[&MedicationRecord]) {
    let headers = ["Medication", "Can Be Crushed?", "Alternative Form", "Recommendation"];
    let mut widths = headers.map(str::len);
    for r in records {
        for (w, cell) in widths.iter_mut().zip(cells(r)) {
            *w = (*w).max(cell.chars().count());
        }
    }
    let line = |row: [&str; 4]| {
        let padded: Vec<String> =
            row.iter().zip(widths).map(|(cell, w)| format!("{cell:<w$}")).collect();
        println!("{}", padded.join("  ").trim_end());
    };
    line(headers);
    for r in records {
        line(cells(r));
    }
}

fn cells(r: &MedicationRecord) -> [&str; 4] {
    [
        r.drug_name.as_str(),
        r.can_be_crushed.as_str(),
        r.alternative_form.as_str(),
        r.recommendation.as_str(),
    ]
}

/// Helper to print whether a directory or file exists.
pub fn print_path_status(label: &str, path: &Path) {
    let exists = path.exists();
    println!("- {label}: {} ({})", if exists { "OK" } else { "MISSING" }, path.display());
}
