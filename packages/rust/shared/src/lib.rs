//! Shared types, error model, and configuration for jup2jek.
//!
//! This crate is the foundation depended on by all other jup2jek crates.
//! It provides:
//! - [`Jup2JekError`]: the unified error type
//! - Domain types ([`Notebook`]) and the well-known names nbconvert and Jekyll use
//! - Configuration ([`SiteConfig`], options file loading and writing)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    DEFAULT_ASSETS_DIR, DEFAULT_POSTS_DIR, OPTIONS_FILE_NAME, OPTIONS_SECTION, SiteConfig,
    load_config_from, load_site_config, render_options, resolve_options_path,
    write_default_options,
};
pub use error::{Jup2JekError, Result};
pub use types::{
    ASSET_FOLDER_SUFFIX, CHECKPOINT_DIR, IMAGE_EMBED_MARKER, NOTEBOOK_EXTENSION, Notebook,
    SITE_URL_PLACEHOLDER,
};
