//! Error types for vaultpress.
//!
//! Library crates use [`VaultpressError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all vaultpress operations.
#[derive(Debug, thiserror::Error)]
pub enum VaultpressError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A user hooks module failed its shape check. Fatal for the whole run.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The external query engine rejected an embedded query.
    #[error("query engine error: {message}")]
    QueryEngine { message: String },

    /// Query blocks rendered further query blocks past the allowed depth.
    #[error("query blocks nested deeper than {limit} levels")]
    QueryDepth { limit: usize },

    /// A user hook raised an error or returned a value of the wrong shape.
    #[error("hook `{hook}` failed: {message}")]
    Hook { hook: String, message: String },

    /// The content behind a cataloged note could not be located.
    #[error("missing source for note {path:?}")]
    MissingSource { path: PathBuf },

    /// Frontmatter could not be parsed or serialized.
    #[error("frontmatter error: {message}")]
    Frontmatter { message: String },

    /// The syntax tree could not be serialized back to text.
    #[error("render error: {0}")]
    Render(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, VaultpressError>;

impl VaultpressError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a query engine error from any displayable message.
    pub fn query_engine(msg: impl Into<String>) -> Self {
        Self::QueryEngine {
            message: msg.into(),
        }
    }

    /// Create a hook error for the named hook slot.
    pub fn hook(hook: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Hook {
            hook: hook.into(),
            message: msg.into(),
        }
    }

    /// Create a frontmatter error from any displayable message.
    pub fn frontmatter(msg: impl Into<String>) -> Self {
        Self::Frontmatter {
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

    /// Errors that invalidate the whole run rather than a single document.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::Validation { .. })
    }

    /// Errors after which the run simply moves on to the next document.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::MissingSource { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = VaultpressError::config("unknown key");
        assert_eq!(err.to_string(), "config error: unknown key");

        let err = VaultpressError::hook("output_path", "expected a string, got table");
        assert_eq!(
            err.to_string(),
            "hook `output_path` failed: expected a string, got table"
        );

        let err = VaultpressError::QueryDepth { limit: 8 };
        assert!(err.to_string().contains("8 levels"));
    }

    #[test]
    fn classification() {
        assert!(VaultpressError::validation("bad hooks").is_fatal());
        assert!(!VaultpressError::query_engine("boom").is_fatal());

        let missing = VaultpressError::MissingSource {
            path: PathBuf::from("notes/gone.md"),
        };
        assert!(missing.is_skippable());
        assert!(!missing.is_fatal());
        assert!(!VaultpressError::hook("frontmatter", "x").is_skippable());
    }
}
