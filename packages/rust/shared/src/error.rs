//! Error types for jup2jek.
//!
//! Library crates use [`Jup2JekError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all jup2jek operations.
#[derive(Debug, thiserror::Error)]
pub enum Jup2JekError {
    /// Options file missing, unreadable as config, or missing required keys.
    #[error("config error: {message}")]
    Config { message: String },

    /// The external notebook converter could not be run or did not succeed.
    #[error("conversion of {notebook:?} failed: {message}")]
    Conversion { notebook: PathBuf, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A path or value that the pipeline cannot work with.
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, Jup2JekError>;

impl Jup2JekError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a conversion error for the given notebook.
    pub fn conversion(notebook: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Conversion {
            notebook: notebook.into(),
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
