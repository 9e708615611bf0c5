//! Shared types, error model, and configuration for specsync.
//!
//! This crate is the foundation depended on by all other specsync crates.
//! It provides:
//! - [`SpecSyncError`] — the unified error type
//! - Domain types ([`SidebarNode`])
//! - Configuration ([`AppConfig`], [`SourceEntry`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CONFIG_FILE_NAME, FetchConfig, LinkEntry, SiteConfig, SourceEntry, TransformConfig,
    init_config, load_config_from, validate,
};
pub use error::{Result, SpecSyncError};
pub use types::{AutogenerateDir, SidebarNode};
