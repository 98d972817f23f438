//! On-disk workspace: where the reference table, letterhead, session register
//! and generated reports live for one installation of the tool.
//!
//! - `WorkspaceLayout`: computed paths, no IO.
//! - `ToolConfig`: serializable settings stored under `.crushcheck/config.json`.
//! - `WorkspaceContext`: layout + config + a reference store wired from them.

mod config;
mod context;
mod layout;

pub use config::{load_config, save_config, ToolConfig, CONFIG_VERSION};
pub use context::WorkspaceContext;
pub use layout::WorkspaceLayout;
