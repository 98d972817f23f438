use std::path::{Path, PathBuf};

/// Conventional reference file names, tried in this order.
pub const DEFAULT_REFERENCE_FILES: [&str; 2] =
    ["Crush_Med_Data_Bank_Clean.xlsx", "Crush_Med_Data_Bank_Clean.csv"];

/// Logical layout of a workspace on disk.
///
/// Derived from a chosen root path. It does not perform any IO itself; the
/// CLI is responsible for creating directories and files based on it.
#[derive(Debug, Clone)]
pub struct WorkspaceLayout {
    /// Root directory of the workspace.
    pub root: PathBuf,
    /// Directory for internal metadata (.crushcheck).
    pub meta_dir: PathBuf,
    /// Path to the tool config file (JSON).
    pub config_path: PathBuf,
    /// Path to the persisted ad-hoc register of the current session.
    pub session_path: PathBuf,
    /// Directory holding the reference table (data).
    pub data_dir: PathBuf,
    /// Directory for static assets such as the letterhead (assets).
    pub assets_dir: PathBuf,
    /// Default output directory for generated reports (reports).
    pub reports_dir: PathBuf,
}

impl WorkspaceLayout {
    /// Compute the default layout for a workspace rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let meta_dir = root.join(".crushcheck");
        let config_path = meta_dir.join("config.json");
        let session_path = meta_dir.join("session.json");
        let data_dir = root.join("data");
        let assets_dir = root.join("assets");
        let reports_dir = root.join("reports");

        Self {
            root,
            meta_dir,
            config_path,
            session_path,
            data_dir,
            assets_dir,
            reports_dir,
        }
    }

    /// Resolve a configured path: absolute paths are kept, relative ones are
    /// taken from the workspace root.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}
