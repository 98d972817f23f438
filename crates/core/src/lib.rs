//! crushcheck-core
//!
//! Core library for medication crushability reviews.
//!
//! This crate loads the medication reference table, keeps the per-session
//! register of ad-hoc medications, resolves a clinician's selection against the
//! merged table, and renders the selection into a Word document and a PDF.
//!
//! All substantive logic lives here so it is fully testable and reusable from
//! multiple frontends (CLI, web form, etc.). Nothing in this crate writes to
//! the terminal or to the report directory; artifacts are returned as bytes.

pub mod model;
pub mod reference;
pub mod report;
pub mod selection;
pub mod session;
pub mod workspace;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
