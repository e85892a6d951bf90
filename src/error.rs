//! Error types for chrome-extension.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use chrome_extension::{Extension, Result};
//!
//! fn example(extension: &Extension) -> Result<()> {
//!     let file = extension.file("js/background.js")?;
//!     file.replace_all("YOUR_API_KEY", "secret")?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidExtensionId`], [`Error::InvalidLink`] |
//! | Download | [`Error::DownloadFailed`], [`Error::Http`] |
//! | Archive | [`Error::InvalidArchive`], [`Error::Zip`] |
//! | Files | [`Error::FileNotFound`], [`Error::InvalidArgument`], [`Error::Patch`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::Regex`], [`Error::Url`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::path::PathBuf;
use std::result::Result as StdResult;

use reqwest::StatusCode;
use thiserror::Error;
use zip::result::ZipError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when extension configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Malformed Chrome extension identifier.
    #[error("Invalid extension id: {id:?} (expected 32 characters in a-p)")]
    InvalidExtensionId {
        /// The rejected identifier.
        id: String,
    },

    /// Web Store link could not be parsed.
    ///
    /// Returned when a link carries no extension id or no extension name.
    #[error("Invalid Web Store link {link}: {message}")]
    InvalidLink {
        /// The rejected link.
        link: String,
        /// Why the link was rejected.
        message: String,
    },

    // ========================================================================
    // Download Errors
    // ========================================================================
    /// Web Store answered with a non-success status.
    #[error("Failed to download extension {id}: HTTP {status}")]
    DownloadFailed {
        /// Extension that was requested.
        id: String,
        /// Status returned by the server.
        status: StatusCode,
    },

    // ========================================================================
    // Archive Errors
    // ========================================================================
    /// Downloaded payload is not a usable CRX or ZIP archive.
    #[error("Invalid extension archive: {message}")]
    InvalidArchive {
        /// Description of the archive problem.
        message: String,
    },

    // ========================================================================
    // File Errors
    // ========================================================================
    /// File not found inside the unpacked extension.
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// Invalid argument.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// Patch hook failure.
    ///
    /// Returned by [`ExtensionConfigurator`](crate::ExtensionConfigurator)
    /// implementations that cannot apply their edits.
    #[error("Patch failed: {message}")]
    Patch {
        /// Description of the failed patch.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// ZIP decoding error.
    #[error("ZIP error: {0}")]
    Zip(#[from] ZipError),

    /// Regular expression compilation error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// URL parse error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid extension id error.
    #[inline]
    pub fn invalid_extension_id(id: impl Into<String>) -> Self {
        Self::InvalidExtensionId { id: id.into() }
    }

    /// Creates an invalid link error.
    #[inline]
    pub fn invalid_link(link: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidLink {
            link: link.into(),
            message: message.into(),
        }
    }

    /// Creates a download failed error.
    #[inline]
    pub fn download_failed(id: impl Into<String>, status: StatusCode) -> Self {
        Self::DownloadFailed {
            id: id.into(),
            status,
        }
    }

    /// Creates an invalid archive error.
    #[inline]
    pub fn invalid_archive(message: impl Into<String>) -> Self {
        Self::InvalidArchive {
            message: message.into(),
        }
    }

    /// Creates a file not found error.
    #[inline]
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a patch error.
    #[inline]
    pub fn patch(message: impl Into<String>) -> Self {
        Self::Patch {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if the error came from talking to the Web Store.
    #[inline]
    #[must_use]
    pub fn is_network_error(&self) -> bool {
        matches!(self, Self::DownloadFailed { .. } | Self::Http(_))
    }

    /// Returns `true` if a requested file does not exist.
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::FileNotFound { .. } => true,
            Self::Io(err) => err.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// Returns `true` if the downloaded payload could not be unpacked.
    #[inline]
    #[must_use]
    pub fn is_archive_error(&self) -> bool {
        matches!(self, Self::InvalidArchive { .. } | Self::Zip(_))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_config_error() {
        let err = Error::config("extension name is required");
        assert_eq!(
            err.to_string(),
            "Configuration error: extension name is required"
        );
    }

    #[test]
    fn test_download_failed_display() {
        let err = Error::download_failed("abc", StatusCode::NOT_FOUND);
        assert_eq!(
            err.to_string(),
            "Failed to download extension abc: HTTP 404 Not Found"
        );
    }

    #[test]
    fn test_is_network_error() {
        let download_err = Error::download_failed("abc", StatusCode::BAD_GATEWAY);
        let other_err = Error::config("test");

        assert!(download_err.is_network_error());
        assert!(!other_err.is_network_error());
    }

    #[test]
    fn test_is_not_found() {
        let missing = Error::file_not_found("js/missing.js");
        let io_missing: Error = IoError::new(ErrorKind::NotFound, "gone").into();
        let denied: Error = IoError::new(ErrorKind::PermissionDenied, "denied").into();

        assert!(missing.is_not_found());
        assert!(io_missing.is_not_found());
        assert!(!denied.is_not_found());
    }

    #[test]
    fn test_is_archive_error() {
        assert!(Error::invalid_archive("bad magic").is_archive_error());
        assert!(Error::Zip(ZipError::FileNotFound).is_archive_error());
        assert!(!Error::patch("test").is_archive_error());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
