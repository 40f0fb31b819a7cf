//! Shared types, error model, and configuration for vaultpress.
//!
//! This crate is the foundation depended on by all other vaultpress crates.
//! It provides:
//! - [`VaultpressError`] — the unified error type
//! - Domain types ([`Note`], [`Catalog`], [`Frontmatter`])
//! - Frontmatter splitting, parsing and rendering
//! - Configuration ([`AppConfig`], [`PipelineConfig`], config loading)

pub mod config;
pub mod error;
pub mod frontmatter;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BulletStyle, ExportSection, PipelineConfig, PipelineSection, QueryEngineSection,
    config_dir, config_file_path, init_config, load_config, load_config_from, validate_config,
};
pub use error::{Result, VaultpressError};
pub use frontmatter::{parse_frontmatter, render_frontmatter, split_frontmatter};
pub use types::{Catalog, CatalogEntry, Frontmatter, Note, slugify};
