// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

//! Ranked full-text search over a directory of text files.
//!
//! Files are split into stemmed terms by the [`Lexer`], collected into a
//! [`DocumentIndex`], and ranked against a query by [`RankedSearcher`] using
//! tf-idf: for each query term, the term's share of the document multiplied
//! by `log10(documents / documents containing the term)`.
//!
//! # Example
//!
//! ```rust,ignore
//! use ranked_searcher_index::{DocumentIndex, RankedSearcher};
//!
//! let mut index = DocumentIndex::new();
//! index.index_dir(Path::new("docs"))?;
//! for result in RankedSearcher::new(&index).search("install formula")? {
//!     println!("{:.4} {}", result.rank, result.path().display());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

mod document;
mod error;
mod highlight;
mod lexer;
mod search;

pub use document::{Document, DocumentIndex, IndexStats, Term};
pub use error::{Error, Result};
pub use highlight::{Highlighter, MatchedLine};
pub use lexer::{Lexer, terms, words};
pub use search::{RankedSearcher, SearchResult, TermStat};
