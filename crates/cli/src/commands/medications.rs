use anyhow::{Context, Result};
use crushcheck_core::model::{Crushability, MedicationRecord};
use crushcheck_core::selection::resolve;
use serde::Serialize;

use crate::commands::{load_merged, open_context, print_records};

#[derive(Serialize)]
pub struct MedicationListing<'a> {
    pub total: usize,
    pub ad_hoc: usize,
    pub medications: Vec<&'a MedicationRecord>,
}

/// List the merged reference, optionally filtered by a case-insensitive search term.
pub fn list_medications_command(
    root: &str,
    search: Option<&str>,
    json: bool,
    reference: Option<&str>,
) -> Result<()> {
    let mut ctx = open_context(root, reference)?;
    let view = load_merged(&mut ctx)?;
    let matches = view.merged.search(search.unwrap_or_default());

    if json {
        let listing = MedicationListing {
            total: view.merged.len(),
            ad_hoc: view.register.len(),
            medications: matches,
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    if matches.is_empty() {
        println!("No medications match.");
        return Ok(());
    }
    for record in &matches {
        println!("{}", record.drug_name);
    }
    println!();
    println!(
        "{} of {} medication(s) ({} added this session)",
        matches.len(),
        view.merged.len(),
        view.register.len()
    );
    Ok(())
}

/// Preview the records for a selection, in selection order.
pub fn show_medications_command(
    root: &str,
    drugs: &[String],
    json: bool,
    reference: Option<&str>,
) -> Result<()> {
    let mut ctx = open_context(root, reference)?;
    let view = load_merged(&mut ctx)?;
    let records = resolve(drugs, &view.merged).context("Failed to resolve selection")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("No medications selected.");
        return Ok(());
    }
    print_records(&records.iter().collect::<Vec<_>>());
    Ok(())
}

/// Add a medication to the session register.
pub fn add_medication_command(
    root: &str,
    name: &str,
    crushable: Crushability,
    alternative: Option<String>,
    recommendation: Option<String>,
    reference: Option<&str>,
) -> Result<()> {
    let mut ctx = open_context(root, reference)?;
    let mut view = load_merged(&mut ctx)?;

    let record = MedicationRecord::new(
        name,
        crushable.as_str(),
        alternative.unwrap_or_default(),
        recommendation.unwrap_or_default(),
    );
    let names = view.register.add(&view.base, record).context("Failed to add medication")?;
    ctx.save_session(&view.register)?;
    tracing::info!(name = %name.trim(), "added ad-hoc medication");

    println!("Added medication: {}", name.trim());
    println!("  Medications available: {}", names.len());
    println!("  Added this session: {}", view.register.len());
    Ok(())
}

/// End the session by discarding every ad-hoc medication.
pub fn clear_session_command(root: &str) -> Result<()> {
    let ctx = open_context(root, None)?;
    match ctx.clear_session()? {
        0 => println!("No session to clear."),
        dropped => println!("Cleared {dropped} ad-hoc medication(s)."),
    }
    Ok(())
}
