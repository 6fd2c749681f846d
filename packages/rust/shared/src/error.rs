//! Error types for Pagesmith.
//!
//! Library crates use [`PagesmithError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Pagesmith operations.
#[derive(Debug, thiserror::Error)]
pub enum PagesmithError {
    /// Configuration loading or validation error. Fatal for the whole run.
    #[error("config error: {message}")]
    Config { message: String },

    /// XML or YAML parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad page id, duplicate ids, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// No template file exists for the requested name.
    #[error("template '{name}' not found at {path:?}")]
    TemplateNotFound { name: String, path: PathBuf },

    /// A template string references a field the content map does not provide.
    #[error("unknown placeholder '{{{placeholder}}}' in template string {text:?}")]
    UnknownPlaceholder { placeholder: String, text: String },

    /// A template string has an unbalanced `{` or `}`.
    #[error("malformed template string {text:?}: {reason}")]
    MalformedTemplate { text: String, reason: String },

    /// Output serialization error (XML or JSON writer).
    #[error("serialization error: {0}")]
    Serialize(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PagesmithError>;

impl PagesmithError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
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
