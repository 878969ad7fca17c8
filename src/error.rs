//! Error types and handling infrastructure for richfind.
//!
//! This module provides a centralized error handling system using `thiserror` for
//! custom error types. The binary layers `anyhow` on top for context.
//!
//! Errors only ever surface at collaborator boundaries (document dispatch, pattern
//! matching, configuration and file loading). The search controller turns every one
//! of them into a logged no-op, so callers of the core API never see them.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for richfind operations.
#[derive(Error, Debug)]
pub enum RichfindError {
    /// File system related errors (file not found, permission denied, etc.)
    #[error("File operation failed: {message}")]
    FileError {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// File not found specifically (common case for user feedback)
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// The pattern matcher rejected a request or could not run it
    #[error("Pattern matching failed: {message}")]
    MatcherError { message: String },

    /// A document transaction could not be applied
    #[error("Document update failed: {message}")]
    DocumentError { message: String },

    /// A replace step addressed positions that are not inside a single text leaf
    #[error("Invalid document range {from}..{to}")]
    InvalidRange { from: usize, to: usize },

    /// Configuration related errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Generic error for cases not covered by specific variants
    #[error("Operation failed: {message}")]
    Other { message: String },
}

/// Standard Result type for richfind operations.
pub type Result<T> = std::result::Result<T, RichfindError>;

impl RichfindError {
    /// Create a FileError from an io::Error with additional context
    pub fn file_error(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::FileError {
            message: message.into(),
            source,
        }
    }

    /// Create a MatcherError with a descriptive message
    pub fn matcher(message: impl Into<String>) -> Self {
        Self::MatcherError {
            message: message.into(),
        }
    }

    /// Create a DocumentError with a descriptive message
    pub fn document(message: impl Into<String>) -> Self {
        Self::DocumentError {
            message: message.into(),
        }
    }

    /// Create a ConfigError with a descriptive message
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a generic Other error with a descriptive message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for RichfindError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::FileError {
                message: "File not found".to_string(),
                source: err,
            },
            std::io::ErrorKind::PermissionDenied => Self::FileError {
                message: "Permission denied".to_string(),
                source: err,
            },
            _ => Self::FileError {
                message: "IO operation failed".to_string(),
                source: err,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let not_found = RichfindError::FileNotFound {
            path: PathBuf::from("/docs/report.txt"),
        };
        assert_eq!(not_found.to_string(), "File not found: /docs/report.txt");

        let range = RichfindError::InvalidRange { from: 4, to: 9 };
        assert_eq!(range.to_string(), "Invalid document range 4..9");

        let matcher = RichfindError::matcher("worker gone");
        assert_eq!(matcher.to_string(), "Pattern matching failed: worker gone");
    }

    #[test]
    fn test_error_constructors() {
        assert!(matches!(
            RichfindError::document("bad step"),
            RichfindError::DocumentError { .. }
        ));
        assert!(matches!(
            RichfindError::config("batch size"),
            RichfindError::ConfigError { .. }
        ));
        assert!(matches!(
            RichfindError::other("unknown"),
            RichfindError::Other { .. }
        ));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err: RichfindError = io_err.into();

        match err {
            RichfindError::FileError { message, .. } => assert_eq!(message, "Permission denied"),
            _ => panic!("Expected FileError variant"),
        }
    }
}
