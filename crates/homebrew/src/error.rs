//! Error types for formula operations.

use miette::{Diagnostic, SourceSpan};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for formula operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while rendering, parsing, validating, or installing a formula.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A template could not be rendered.
    #[error("Template error: {message}")]
    #[diagnostic(
        code(ranked_searcher::homebrew::template),
        help("Provide --version and a checksum for every sha256 placeholder")
    )]
    Template {
        /// The error message
        message: String,
        /// Placeholders that had no value
        missing: Vec<String>,
    },

    /// A formula file could not be parsed.
    #[error("Formula parse error: {message}")]
    #[diagnostic(code(ranked_searcher::homebrew::parse))]
    Parse {
        /// The error message
        message: String,
        /// The formula source
        #[source_code]
        src: String,
        /// The offending line
        #[label("here")]
        span: SourceSpan,
    },

    /// A formula failed validation.
    #[error("Formula validation failed: {message}")]
    #[diagnostic(
        code(ranked_searcher::homebrew::validation),
        help("Every target needs an https URL and a 64 character hex sha256")
    )]
    Validation {
        /// Summary of the validation errors
        message: String,
    },

    /// Two formulas differ in layout.
    #[error("Formula shape differs at line {line}: expected `{expected}`, found `{actual}`")]
    #[diagnostic(code(ranked_searcher::homebrew::shape))]
    ShapeMismatch {
        /// 1-based line number of the first difference
        line: usize,
        /// Line from the expected formula (blanked)
        expected: String,
        /// Line from the actual formula (blanked)
        actual: String,
    },

    /// Installing a release archive failed.
    #[error("Install failed: {message}")]
    #[diagnostic(code(ranked_searcher::homebrew::install))]
    Install {
        /// The error message
        message: String,
        /// The path involved, if any
        path: Option<PathBuf>,
    },

    /// The installed binary failed its smoke test.
    #[error("Smoke test failed: {message}")]
    #[diagnostic(
        code(ranked_searcher::homebrew::smoke_test),
        help("Run the installed binary by hand to see its output")
    )]
    SmokeTest {
        /// The error message
        message: String,
        /// Exit code, if the process exited normally
        status: Option<i32>,
        /// Captured standard error
        stderr: String,
    },

    /// Release-level error (checksums, versions, config).
    #[error(transparent)]
    #[diagnostic(transparent)]
    Release(#[from] ranked_searcher_release::Error),

    /// Wrapped I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(ranked_searcher::homebrew::io))]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new template error.
    #[must_use]
    pub fn template(message: impl Into<String>) -> Self {
        Self::Template {
            message: message.into(),
            missing: Vec::new(),
        }
    }

    /// Create a template error listing placeholders without values.
    #[must_use]
    pub fn missing_placeholders(missing: Vec<String>) -> Self {
        Self::Template {
            message: format!("no value for placeholder(s): {}", missing.join(", ")),
            missing,
        }
    }

    /// Create a new parse error pointing at a span of the source.
    #[must_use]
    pub fn parse(message: impl Into<String>, src: &str, span: impl Into<SourceSpan>) -> Self {
        Self::Parse {
            message: message.into(),
            src: src.to_string(),
            span: span.into(),
        }
    }

    /// Create a new validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new install error.
    #[must_use]
    pub fn install(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Install {
            message: message.into(),
            path,
        }
    }

    /// Create a new smoke test error.
    #[must_use]
    pub fn smoke_test(
        message: impl Into<String>,
        status: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::SmokeTest {
            message: message.into(),
            status,
            stderr: stderr.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_placeholders_message() {
        let err = Error::missing_placeholders(vec![
            "sha256_macos_arm".to_string(),
            "sha256_linux_intel".to_string(),
        ]);
        assert!(err
            .to_string()
            .contains("sha256_macos_arm, sha256_linux_intel"));
    }

    #[test]
    fn test_parse_error_keeps_source() {
        let err = Error::parse("unknown block", "class X < Formula\n", (0, 5));
        match err {
            Error::Parse { src, span, .. } => {
                assert_eq!(src, "class X < Formula\n");
                assert_eq!(span.offset(), 0);
                assert_eq!(span.len(), 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_release_error_is_transparent() {
        let err: Error = ranked_searcher_release::Error::invalid_version("x.y").into();
        assert_eq!(err.to_string(), "Invalid version: x.y");
    }
}
