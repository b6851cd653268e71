//! Document index.
//!
//! Holds per-document term counts, the number of documents each term occurs
//! in, and postings from term to documents.

use crate::error::{Error, Result};
use crate::lexer;
use ignore::WalkBuilder;
use rayon::iter::{ParallelBridge, ParallelIterator};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A stemmed word.
pub type Term = String;

/// One indexed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    path: PathBuf,
    total_terms: usize,
    term_freq: HashMap<Term, usize>,
}

impl Document {
    /// Tokenizes `content` into a document.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, content: &str) -> Self {
        let terms = lexer::terms(content);
        let total_terms = terms.len();
        let mut term_freq = HashMap::new();
        for term in terms {
            *term_freq.entry(term).or_insert(0) += 1;
        }
        Self {
            path: path.into(),
            total_terms,
            term_freq,
        }
    }

    /// Path the document was read from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of terms, counting repeats.
    #[must_use]
    pub fn total_terms(&self) -> usize {
        self.total_terms
    }

    /// How often `term` occurs; zero if it does not.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn term_frequency(&self, term: &str) -> f64 {
        self.term_freq.get(term).copied().unwrap_or(0) as f64
    }

    /// Distinct terms.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.term_freq.keys().map(String::as_str)
    }
}

/// Summary of an [`DocumentIndex::index_dir`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Files added to the index
    pub files_indexed: usize,
    /// Files that could not be read as UTF-8 text
    pub files_skipped: usize,
    /// Distinct terms in the index afterwards
    pub terms: usize,
}

/// Index over a set of documents.
#[derive(Debug, Default)]
pub struct DocumentIndex {
    documents: Vec<Document>,
    by_path: HashMap<PathBuf, usize>,
    postings: HashMap<Term, BTreeSet<usize>>,
    document_freq: HashMap<Term, usize>,
}

impl DocumentIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokenizes and adds a document.
    ///
    /// Returns false, leaving the index unchanged, if `path` is already
    /// indexed.
    pub fn add_document(&mut self, path: impl Into<PathBuf>, content: &str) -> bool {
        self.insert(Document::new(path, content))
    }

    fn insert(&mut self, document: Document) -> bool {
        if self.by_path.contains_key(document.path()) {
            debug!(path = %document.path().display(), "Document already indexed");
            return false;
        }

        let id = self.documents.len();
        for term in document.terms() {
            *self.document_freq.entry(term.to_string()).or_insert(0) += 1;
            self.postings.entry(term.to_string()).or_default().insert(id);
        }
        self.by_path.insert(document.path().to_path_buf(), id);
        self.documents.push(document);
        true
    }

    /// Indexes every readable text file below `root`.
    ///
    /// The walk honours `.gitignore` and skips hidden files. Files are read
    /// and tokenized in parallel; files that cannot be read as UTF-8 are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` is not a directory.
    pub fn index_dir(&mut self, root: &Path) -> Result<IndexStats> {
        if !root.is_dir() {
            return Err(Error::NotADirectory {
                path: root.to_path_buf(),
            });
        }

        let results: Vec<std::result::Result<Document, PathBuf>> = WalkBuilder::new(root)
            .standard_filters(true)
            .build()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
            .par_bridge()
            .map(|entry| {
                let path = entry.into_path();
                match fs::read_to_string(&path) {
                    Ok(content) => Ok(Document::new(path, &content)),
                    Err(e) => {
                        debug!(path = %path.display(), error = %e, "Skipping unreadable file");
                        Err(path)
                    }
                }
            })
            .collect();

        let mut documents = Vec::with_capacity(results.len());
        let mut stats = IndexStats::default();
        for result in results {
            match result {
                Ok(document) => documents.push(document),
                Err(_) => stats.files_skipped += 1,
            }
        }

        // parallel reads finish in any order
        documents.sort_by(|a, b| a.path.cmp(&b.path));
        for document in documents {
            if self.insert(document) {
                stats.files_indexed += 1;
            }
        }
        stats.terms = self.document_freq.len();

        info!(
            root = %root.display(),
            files_indexed = stats.files_indexed,
            files_skipped = stats.files_skipped,
            terms = stats.terms,
            "Indexed directory"
        );
        Ok(stats)
    }

    /// Documents containing `term`.
    pub fn documents(&self, term: &str) -> impl Iterator<Item = &Document> {
        self.postings
            .get(term)
            .into_iter()
            .flatten()
            .map(|&id| &self.documents[id])
    }

    /// Looks up a document by path.
    #[must_use]
    pub fn document(&self, path: &Path) -> Option<&Document> {
        self.by_path.get(path).map(|&id| &self.documents[id])
    }

    /// Number of documents containing `term`; 1 for unknown terms so idf
    /// never divides by zero.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn document_frequency(&self, term: &str) -> f64 {
        self.document_freq.get(term).copied().unwrap_or(1) as f64
    }

    /// Number of indexed documents.
    #[must_use]
    pub fn total_documents(&self) -> usize {
        self.documents.len()
    }

    /// Number of distinct terms.
    #[must_use]
    pub fn total_terms(&self) -> usize {
        self.document_freq.len()
    }
}
