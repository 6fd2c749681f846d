//! Shared types, error model, and configuration for Pagesmith.
//!
//! This crate is the foundation depended on by all other Pagesmith crates.
//! It provides:
//! - [`PagesmithError`] — the unified error type
//! - Domain types ([`Structure`], [`ContentMap`], [`TemplateNode`], [`BuildManifest`])
//! - Configuration ([`AppConfig`], [`BuildConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BuildConfig, BuildDefaults, CONFIG_FILE_NAME, PathsConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{PagesmithError, Result};
pub use types::{
    BuildManifest, CONTENT_KEYS, CURRENT_SCHEMA_VERSION, CategoryNode, ContentMap, PageRef,
    RunId, Scalar, SkippedPage, Structure, Template, TemplateNode,
};
