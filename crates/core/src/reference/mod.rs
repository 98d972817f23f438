//! Medication reference store.
//!
//! The reference table is read from the first provider that has data, in the
//! order the providers were registered: typically the configured file paths,
//! then an upload supplied by the frontend. The parsed table is cached for the
//! lifetime of the store.

mod table_file;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::model::ReferenceTable;

pub use table_file::{parse_table, TableFormat, REQUIRED_COLUMNS};

#[derive(Debug, Error)]
pub enum ReferenceError {
    /// Every provider was tried and none had data.
    #[error("No medication reference available (tried: {})", .tried.join(", "))]
    DataUnavailable { tried: Vec<String> },

    #[error("Reference table {origin} is missing required column '{column}'")]
    MissingColumn { origin: String, column: &'static str },

    #[error("Reference workbook {origin} has no worksheet with a header row")]
    EmptyWorkbook { origin: String },

    #[error("Failed to parse CSV reference {origin}: {err}")]
    Csv {
        origin: String,
        #[source]
        err: csv::Error,
    },

    #[error("Failed to parse XLSX reference {origin}: {err}")]
    Xlsx {
        origin: String,
        #[source]
        err: calamine::XlsxError,
    },

    #[error("Failed to read reference file {}: {err}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },
}

/// Raw reference data handed over by a provider.
#[derive(Debug, Clone)]
pub struct SourceData {
    /// Human-readable origin (path or upload name) used in errors.
    pub origin: String,
    /// File name used to pick the table format.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// A place the reference table may come from.
pub trait ReferenceSource: Send + Sync {
    /// Returns `Ok(None)` when this provider has nothing to offer, so the
    /// store moves on to the next one.
    fn fetch(&self) -> Result<Option<SourceData>, ReferenceError>;
    fn name(&self) -> String;
}

/// Reference file at a fixed path. A missing file is not an error.
#[derive(Debug, Clone)]
pub struct PathSource {
    path: PathBuf,
}

impl PathSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReferenceSource for PathSource {
    fn fetch(&self) -> Result<Option<SourceData>, ReferenceError> {
        if !self.path.is_file() {
            return Ok(None);
        }
        let bytes = std::fs::read(&self.path)
            .map_err(|err| ReferenceError::Io { path: self.path.clone(), err })?;
        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        Ok(Some(SourceData { origin: self.name(), file_name, bytes }))
    }

    fn name(&self) -> String {
        self.path.display().to_string()
    }
}

/// Reference data supplied by the frontend (e.g. an uploaded file).
#[derive(Debug, Clone)]
pub struct UploadSource {
    file_name: String,
    bytes: Vec<u8>,
}

impl UploadSource {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { file_name: file_name.into(), bytes }
    }
}

impl ReferenceSource for UploadSource {
    fn fetch(&self) -> Result<Option<SourceData>, ReferenceError> {
        if self.bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(SourceData {
            origin: self.name(),
            file_name: self.file_name.clone(),
            bytes: self.bytes.clone(),
        }))
    }

    fn name(&self) -> String {
        format!("upload:{}", self.file_name)
    }
}

/// Ordered list of providers plus the cached table.
#[derive(Default)]
pub struct ReferenceStore {
    sources: Vec<Box<dyn ReferenceSource>>,
    cache: Option<(String, Arc<ReferenceTable>)>,
}

impl ReferenceStore {
    pub fn new() -> Self {
        Self { sources: Vec::new(), cache: None }
    }

    /// Append a provider; it is tried after every provider already registered.
    pub fn register<S: ReferenceSource + 'static>(&mut self, source: S) -> &mut Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Insert a provider ahead of all others.
    pub fn register_first<S: ReferenceSource + 'static>(&mut self, source: S) -> &mut Self {
        self.sources.insert(0, Box::new(source));
        self
    }

    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Load the reference table, parsing it only on the first successful call.
    pub fn load(&mut self) -> Result<Arc<ReferenceTable>, ReferenceError> {
        if let Some((origin, table)) = &self.cache {
            tracing::debug!(origin = %origin, "reference table served from cache");
            return Ok(Arc::clone(table));
        }

        for source in &self.sources {
            let Some(data) = source.fetch()? else {
                tracing::debug!(source = %source.name(), "reference provider has no data");
                continue;
            };
            let format = TableFormat::detect(&data.file_name, &data.bytes);
            let table = Arc::new(parse_table(&data.origin, format, &data.bytes)?);
            tracing::debug!(origin = %data.origin, rows = table.len(), "reference table loaded");
            self.cache = Some((data.origin, Arc::clone(&table)));
            return Ok(table);
        }

        Err(ReferenceError::DataUnavailable { tried: self.source_names() })
    }

    /// Origin of the cached table, if one has been loaded.
    pub fn loaded_from(&self) -> Option<&str> {
        self.cache.as_ref().map(|(origin, _)| origin.as_str())
    }
}
