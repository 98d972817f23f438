use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use super::config::{load_config, ToolConfig};
use super::layout::WorkspaceLayout;
use crate::model::ReferenceTable;
use crate::reference::{PathSource, ReferenceError, ReferenceStore, UploadSource};
use crate::report::ReportOptions;
use crate::session::AdHocRegister;

/// Convenience wrapper bundling layout, config, and a reference store wired
/// from the configured paths.
pub struct WorkspaceContext {
    pub layout: WorkspaceLayout,
    pub config: ToolConfig,
    pub store: ReferenceStore,
}

impl WorkspaceContext {
    /// Load the config for `root` and register one path provider per
    /// configured reference path, in order.
    pub fn from_root(root: impl AsRef<Path>) -> Result<Self> {
        let layout = WorkspaceLayout::new(root);
        let config = load_config(&layout)?;
        let mut store = ReferenceStore::new();
        for path in &config.reference_paths {
            store.register(PathSource::new(layout.resolve(path)));
        }
        Ok(Self { layout, config, store })
    }

    /// Put an explicitly chosen reference file ahead of the configured paths.
    pub fn prefer_reference_file(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.store.register_first(PathSource::new(path));
        self
    }

    /// Fall back to uploaded bytes when no configured path has data.
    pub fn with_upload(&mut self, file_name: impl Into<String>, bytes: Vec<u8>) -> &mut Self {
        self.store.register(UploadSource::new(file_name, bytes));
        self
    }

    pub fn load_reference(&mut self) -> Result<Arc<ReferenceTable>, ReferenceError> {
        self.store.load()
    }

    /// Configured reference paths, resolved against the root.
    pub fn reference_paths(&self) -> Vec<PathBuf> {
        self.config.reference_paths.iter().map(|p| self.layout.resolve(p)).collect()
    }

    /// The register persisted for the current session, or an empty one.
    pub fn load_session(&self) -> Result<AdHocRegister> {
        let path = &self.layout.session_path;
        if !path.exists() {
            return Ok(AdHocRegister::new());
        }
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read session at {}", path.display()))?;
        let register = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse session JSON at {}", path.display()))?;
        Ok(register)
    }

    pub fn save_session(&self, register: &AdHocRegister) -> Result<()> {
        std::fs::create_dir_all(&self.layout.meta_dir).with_context(|| {
            format!("Failed to create metadata directory {}", self.layout.meta_dir.display())
        })?;
        let json = serde_json::to_string_pretty(register).context("Failed to serialize session")?;
        std::fs::write(&self.layout.session_path, json).with_context(|| {
            format!("Failed to write session at {}", self.layout.session_path.display())
        })?;
        Ok(())
    }

    /// End the session: every ad-hoc entry is discarded and the emptied
    /// register is persisted. Returns how many entries were dropped.
    pub fn clear_session(&self) -> Result<usize> {
        let mut register = self.load_session()?;
        let dropped = register.len();
        if dropped == 0 {
            return Ok(0);
        }
        register.clear();
        self.save_session(&register)?;
        tracing::debug!(dropped, "cleared session register");
        Ok(dropped)
    }

    /// Report options from config, with the letterhead read if the file exists.
    pub fn report_options(&self) -> Result<ReportOptions> {
        let letterhead_path = self.layout.resolve(&self.config.letterhead_path);
        let letterhead = if letterhead_path.is_file() {
            let bytes = std::fs::read(&letterhead_path).with_context(|| {
                format!("Failed to read letterhead at {}", letterhead_path.display())
            })?;
            Some(bytes)
        } else {
            tracing::debug!(path = %letterhead_path.display(), "no letterhead found");
            None
        };
        Ok(ReportOptions {
            locale: self.config.locale,
            letterhead,
            signature_lines: self.config.signature_lines,
            attribution: self.config.attribution.clone(),
        })
    }
}
