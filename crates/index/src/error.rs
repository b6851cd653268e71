//! Error types for indexing and search.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for index operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while indexing or searching.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A file or directory could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    #[diagnostic(code(ranked_searcher::index::io))]
    Io {
        /// The path that failed
        path: PathBuf,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// The search root does not exist or is not a directory.
    #[error("Not a directory: {}", path.display())]
    #[diagnostic(
        code(ranked_searcher::index::not_a_directory),
        help("Pass --dir with an existing directory")
    )]
    NotADirectory {
        /// The offending path
        path: PathBuf,
    },

    /// The query contained no searchable words.
    #[error("Query contains no searchable words")]
    #[diagnostic(
        code(ranked_searcher::index::empty_query),
        help("Words are runs of letters or digits; punctuation is ignored")
    )]
    EmptyQuery,

    /// The highlight pattern could not be built.
    #[error("Invalid highlight pattern: {0}")]
    #[diagnostic(code(ranked_searcher::index::regex))]
    Regex(#[from] regex::Error),
}

impl Error {
    /// Create a new I/O error for a path.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
