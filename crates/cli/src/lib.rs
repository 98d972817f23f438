use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tracing_subscriber::EnvFilter;

pub mod commands;

/// Environment variable holding the log filter (e.g. `debug`, `crushcheck_core=trace`).
pub const LOG_ENV: &str = "CRUSHCHECK_LOG";

/// Install the stderr log subscriber. Defaults to `warn` so stdout stays
/// clean for `--json` output.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Absolute form of a `--root`, `--reference` or `--out-dir` argument.
///
/// Existing paths are canonicalized. Missing ones (a workspace about to be
/// created by `init`, a fresh output directory) are joined onto the current
/// directory instead.
pub fn canonicalize_or_current(root: &str) -> Result<PathBuf> {
    let path = Path::new(root);
    if path != Path::new(".") {
        if let Ok(canonical) = path.canonicalize() {
            return Ok(canonical);
        }
    }
    let cwd = env::current_dir().context("Failed to get current directory")?;
    Ok(if path == Path::new(".") { cwd } else { cwd.join(path) })
}

/// Infer a workspace name from the root path.
///
/// If the root has no final component (e.g., `/`), fallback to `unnamed-workspace`.
pub fn infer_workspace_name(root: &Path) -> String {
    root.file_name().and_then(|os_str| os_str.to_str()).unwrap_or("unnamed-workspace").to_string()
}

/// Hex SHA-256 of a file, shown by `info` so a reference table can be
/// matched against a known release.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path)
        .with_context(|| format!("Failed to open file for hashing: {}", path.display()))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .with_context(|| format!("Failed to read file for hashing: {}", path.display()))?;
    Ok(format!("{:x}", hasher.finalize()))
}
