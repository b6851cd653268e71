//! Error types for release operations.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for release operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while packaging, checksumming, or versioning a release.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Failed to parse or validate a version string.
    #[error("Invalid version: {version}")]
    #[diagnostic(
        code(ranked_searcher::release::invalid_version),
        help("Version must follow semantic versioning (e.g., 0.0.2, 1.0.0-beta.1)")
    )]
    InvalidVersion {
        /// The invalid version string
        version: String,
    },

    /// Configuration error.
    #[error("Release configuration error: {message}")]
    #[diagnostic(code(ranked_searcher::release::config), help("{help}"))]
    Config {
        /// The error message
        message: String,
        /// Help text for the user
        help: String,
    },

    /// Artifact packaging error.
    #[error("Artifact error: {message}")]
    #[diagnostic(
        code(ranked_searcher::release::artifact),
        help("Check that the binary exists and is readable")
    )]
    Artifact {
        /// The error message
        message: String,
        /// The path that caused the error
        path: Option<PathBuf>,
    },

    /// A file's content hash differs from the published checksum.
    #[error("Checksum mismatch for {}: expected {expected}, got {actual}", path.display())]
    #[diagnostic(
        code(ranked_searcher::release::checksum_mismatch),
        help("The archive does not match the published release; download it again")
    )]
    ChecksumMismatch {
        /// Checksum recorded for the release
        expected: String,
        /// Checksum computed from the file on disk
        actual: String,
        /// The file that was hashed
        path: PathBuf,
    },

    /// Malformed checksums manifest or checksum value.
    #[error("Invalid checksum: {message}")]
    #[diagnostic(
        code(ranked_searcher::release::checksum),
        help("Checksums are 64 hexadecimal characters, one `<sha256>  <file>` entry per line")
    )]
    Checksum {
        /// The error message
        message: String,
    },

    /// Release versions are out of order.
    #[error("Release history error: {message}")]
    #[diagnostic(
        code(ranked_searcher::release::history),
        help("Each release must have a strictly greater version than the one before it")
    )]
    History {
        /// The error message
        message: String,
    },

    /// Wrapped I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(ranked_searcher::release::io))]
    Io(#[from] std::io::Error),

    /// Wrapped TOML parsing error.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(ranked_searcher::release::toml_parse))]
    TomlParse(#[from] toml::de::Error),
}

impl Error {
    /// Create a new invalid version error.
    #[must_use]
    pub fn invalid_version(version: impl Into<String>) -> Self {
        Self::InvalidVersion {
            version: version.into(),
        }
    }

    /// Create a new configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: help.into(),
        }
    }

    /// Create a new artifact error.
    #[must_use]
    pub fn artifact(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Artifact {
            message: message.into(),
            path,
        }
    }

    /// Create a new checksum mismatch error.
    #[must_use]
    pub fn checksum_mismatch(
        expected: impl Into<String>,
        actual: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self::ChecksumMismatch {
            expected: expected.into(),
            actual: actual.into(),
            path: path.into(),
        }
    }

    /// Create a new checksum format error.
    #[must_use]
    pub fn checksum(message: impl Into<String>) -> Self {
        Self::Checksum {
            message: message.into(),
        }
    }

    /// Create a new release history error.
    #[must_use]
    pub fn history(message: impl Into<String>) -> Self {
        Self::History {
            message: message.into(),
        }
    }
}
