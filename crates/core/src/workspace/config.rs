use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::layout::{WorkspaceLayout, DEFAULT_REFERENCE_FILES};
use crate::report::{Locale, DEFAULT_ATTRIBUTION};

/// Current config format version.
pub const CONFIG_VERSION: &str = "0.1.0";

/// Serializable settings for a workspace.
///
/// Lives at `.crushcheck/config.json`. Every field except `name` has a
/// default, so hand-written configs may stay short.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Human-friendly workspace name (e.g. the pharmacy or care home).
    pub name: String,
    /// Schema/config version. This is about the config format, not the tool version.
    #[serde(default = "default_config_version")]
    pub config_version: String,
    /// Reference table candidates in provider order, relative to the root
    /// unless absolute.
    #[serde(default = "default_reference_paths")]
    pub reference_paths: Vec<String>,
    #[serde(default = "default_letterhead_path")]
    pub letterhead_path: String,
    #[serde(default)]
    pub locale: Locale,
    #[serde(default)]
    pub signature_lines: bool,
    #[serde(default = "default_attribution")]
    pub attribution: String,
    /// Facility printed on reports when none is given for the patient.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility: Option<String>,
}

fn default_config_version() -> String {
    CONFIG_VERSION.to_string()
}

fn default_reference_paths() -> Vec<String> {
    DEFAULT_REFERENCE_FILES.iter().map(|f| format!("data/{f}")).collect()
}

fn default_letterhead_path() -> String {
    "assets/letterhead.png".to_string()
}

fn default_attribution() -> String {
    DEFAULT_ATTRIBUTION.to_string()
}

impl ToolConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config_version: default_config_version(),
            reference_paths: default_reference_paths(),
            letterhead_path: default_letterhead_path(),
            locale: Locale::default(),
            signature_lines: false,
            attribution: default_attribution(),
            facility: None,
        }
    }
}

/// Load the config for `layout`. A missing file yields defaults named after
/// the root directory; an unreadable or malformed one is an error.
pub fn load_config(layout: &WorkspaceLayout) -> Result<ToolConfig> {
    if !layout.config_path.exists() {
        let name = layout
            .root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "crushcheck".to_string());
        return Ok(ToolConfig::new(name));
    }
    let config_json = std::fs::read_to_string(&layout.config_path).with_context(|| {
        format!("Failed to read config at {}", layout.config_path.display())
    })?;
    let config: ToolConfig = serde_json::from_str(&config_json).with_context(|| {
        format!("Failed to parse config JSON at {}", layout.config_path.display())
    })?;
    Ok(config)
}

/// Write `config` as pretty JSON, creating the metadata directory if needed.
pub fn save_config(layout: &WorkspaceLayout, config: &ToolConfig) -> Result<()> {
    std::fs::create_dir_all(&layout.meta_dir).with_context(|| {
        format!("Failed to create metadata directory {}", layout.meta_dir.display())
    })?;
    let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(&layout.config_path, json)
        .with_context(|| format!("Failed to write config at {}", layout.config_path.display()))?;
    Ok(())
}
