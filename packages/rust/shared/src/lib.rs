//! Shared types, error model, and configuration for wikisift.
//!
//! This crate is the foundation depended on by all other wikisift crates.
//! It provides:
//! - [`WikiSiftError`]: the unified error type
//! - Domain types ([`DocumentSource`], [`SourceKind`], [`IndexMode`])
//! - Configuration ([`AppConfig`], [`IndexConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, HttpConfig, IndexConfig, SearchConfig, UrlsConfig, config_dir, config_file_path,
    default_documents, init_config, init_config_at, load_config, load_config_from,
};
pub use error::{Result, WikiSiftError};
pub use types::{DocumentSource, IndexMode, SourceKind};
