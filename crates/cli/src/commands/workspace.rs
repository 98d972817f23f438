use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use crushcheck_core::reference::ReferenceError;
use crushcheck_core::workspace::{load_config, save_config, ToolConfig, WorkspaceLayout};
use serde::Serialize;

use crate::commands::{open_context, print_path_status};
use crate::{canonicalize_or_current, infer_workspace_name, sha256_file};

#[derive(Serialize)]
pub struct WorkspaceInfoSnapshot {
    pub name: String,
    pub root: String,
    pub config_file: String,
    pub config_version: String,
    pub locale: String,
    pub signature_lines: bool,
    pub facility: Option<String>,
    pub reference_paths: Vec<String>,
    pub reference: Option<ReferenceInfo>,
    pub letterhead: Option<String>,
    pub ad_hoc_entries: usize,
    pub layout: WorkspaceInfoLayout,
}

#[derive(Serialize)]
pub struct ReferenceInfo {
    pub source: String,
    pub rows: usize,
    /// SHA-256 of the reference file; absent for uploads.
    pub sha256: Option<String>,
}

#[derive(Serialize)]
pub struct WorkspaceInfoLayout {
    pub meta_dir: String,
    pub data_dir: String,
    pub assets_dir: String,
    pub reports_dir: String,
}

/// Initialize a workspace at `root`.
///
/// An existing config is kept; only its name is replaced when `name` is given.
pub fn init_command(root: &str, name: Option<String>) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = WorkspaceLayout::new(&root_path);

    for dir in [&layout.meta_dir, &layout.data_dir, &layout.assets_dir, &layout.reports_dir] {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }

    let config = if layout.config_path.exists() {
        let mut config = load_config(&layout)?;
        if let Some(name) = name {
            config.name = name;
        }
        config
    } else {
        ToolConfig::new(name.unwrap_or_else(|| infer_workspace_name(&root_path)))
    };
    save_config(&layout, &config)?;

    println!("Initialized crushcheck workspace:");
    println!("  Name: {}", config.name);
    println!("  Root: {}", layout.root.display());
    println!("  Config: {}", layout.config_path.display());
    println!("  Data dir: {}", layout.data_dir.display());
    println!("  Assets dir: {}", layout.assets_dir.display());
    println!("  Reports dir: {}", layout.reports_dir.display());
    println!(
        "Place Crush_Med_Data_Bank_Clean.xlsx (or .csv) in the data dir before generating reports."
    );

    Ok(())
}

/// Show configuration, reference status, and session size for a workspace.
pub fn info_command(root: &str, json: bool) -> Result<()> {
    let mut ctx = open_context(root, None)?;

    let reference = match ctx.load_reference() {
        Ok(table) => {
            let source = ctx.store.loaded_from().unwrap_or_default().to_string();
            let path = Path::new(&source);
            let sha256 = if path.is_file() { Some(sha256_file(path)?) } else { None };
            Some(ReferenceInfo { source, rows: table.len(), sha256 })
        }
        Err(ReferenceError::DataUnavailable { .. }) => None,
        Err(err) => return Err(err).context("Failed to load medication reference"),
    };
    let register = ctx.load_session()?;
    let letterhead_path = ctx.layout.resolve(&ctx.config.letterhead_path);

    let layout = &ctx.layout;
    let snapshot = WorkspaceInfoSnapshot {
        name: ctx.config.name.clone(),
        root: layout.root.display().to_string(),
        config_file: layout.config_path.display().to_string(),
        config_version: ctx.config.config_version.clone(),
        locale: ctx.config.locale.to_string(),
        signature_lines: ctx.config.signature_lines,
        facility: ctx.config.facility.clone(),
        reference_paths: ctx.reference_paths().iter().map(|p| p.display().to_string()).collect(),
        reference,
        letterhead: letterhead_path.is_file().then(|| letterhead_path.display().to_string()),
        ad_hoc_entries: register.len(),
        layout: WorkspaceInfoLayout {
            meta_dir: layout.meta_dir.display().to_string(),
            data_dir: layout.data_dir.display().to_string(),
            assets_dir: layout.assets_dir.display().to_string(),
            reports_dir: layout.reports_dir.display().to_string(),
        },
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("crushcheck Workspace Info");
    println!("=========================");
    println!("Name: {}", snapshot.name);
    println!("Root: {}", snapshot.root);
    println!("Config file: {}", snapshot.config_file);
    println!("Config version: {}", snapshot.config_version);
    println!("Locale: {}", snapshot.locale);
    println!("Signature lines: {}", if snapshot.signature_lines { "yes" } else { "no" });
    if let Some(facility) = &snapshot.facility {
        println!("Default facility: {facility}");
    }
    println!();

    println!("Reference:");
    match &snapshot.reference {
        Some(info) => {
            println!("  Source: {}", info.source);
            println!("  Rows: {}", info.rows);
            if let Some(hash) = &info.sha256 {
                println!("  SHA-256: {hash}");
            }
        }
        None => {
            println!("  MISSING (tried: {})", snapshot.reference_paths.join(", "));
        }
    }
    println!("Ad-hoc medications this session: {}", snapshot.ad_hoc_entries);
    println!();

    println!("Paths:");
    print_path_status("Meta dir (.crushcheck)", &layout.meta_dir);
    print_path_status("Data dir", &layout.data_dir);
    print_path_status("Letterhead", &letterhead_path);
    print_path_status("Reports dir", &layout.reports_dir);

    Ok(())
}
