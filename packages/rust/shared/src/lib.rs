//! Shared types, error model, and configuration for contentkit.
//!
//! This crate is the foundation depended on by all other contentkit crates.
//! It provides:
//! - [`ContentKitError`] — the unified error type
//! - Domain types ([`ContentNode`], [`ExtendedContentNode`], [`MinimalContentNode`], [`Schema`])
//! - Configuration ([`AppConfig`], [`ExtractorOptions`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ExtractorConfig, ExtractorOptions, TreeConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{ContentKitError, Result};
pub use types::{
    ContentNode, ExtendedContentNode, MinimalContentNode, NodeType, PATH_SEPARATOR, Schema,
};
