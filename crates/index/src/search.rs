//! tf-idf ranking.

use crate::document::{Document, DocumentIndex, Term};
use crate::error::{Error, Result};
use crate::lexer;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// Contribution of one query term to a result.
#[derive(Debug, Clone, PartialEq)]
pub struct TermStat {
    /// The stemmed query term
    pub term: Term,
    /// Occurrences of the term in the document
    pub term_freq: f64,
    /// Documents in the index containing the term
    pub document_freq: f64,
}

/// A ranked document.
#[derive(Debug, Clone)]
pub struct SearchResult<'a> {
    /// Sum of tf-idf over the query terms
    pub rank: f64,
    /// The matching document
    pub document: &'a Document,
    /// Per-term statistics, ordered by term
    pub stats: Vec<TermStat>,
}

impl SearchResult<'_> {
    /// Path of the matching document.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.document.path()
    }
}

/// Ranks the documents of an index against a query.
pub struct RankedSearcher<'a> {
    index: &'a DocumentIndex,
    limit: Option<usize>,
}

impl<'a> RankedSearcher<'a> {
    /// Creates a searcher over `index`.
    #[must_use]
    pub fn new(index: &'a DocumentIndex) -> Self {
        Self { index, limit: None }
    }

    /// Keeps only the best `limit` results.
    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Searches the index.
    ///
    /// Every document containing at least one query term is a candidate.
    /// Results are ordered by rank, highest first, then by path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyQuery`] if the query has no words.
    pub fn search(&self, query: &str) -> Result<Vec<SearchResult<'a>>> {
        let terms: BTreeSet<Term> = lexer::terms(query).into_iter().collect();
        if terms.is_empty() {
            return Err(Error::EmptyQuery);
        }

        let mut candidates: HashMap<&Path, &'a Document> = HashMap::new();
        for term in &terms {
            for document in self.index.documents(term) {
                candidates.insert(document.path(), document);
            }
        }

        let total_documents = self.index.total_documents();
        let mut results: Vec<SearchResult<'a>> = candidates
            .into_values()
            .map(|document| self.score(document, &terms, total_documents))
            .collect();

        results.sort_by(|a, b| {
            b.rank
                .total_cmp(&a.rank)
                .then_with(|| a.path().cmp(b.path()))
        });
        if let Some(limit) = self.limit {
            results.truncate(limit);
        }

        tracing::debug!(
            terms = terms.len(),
            results = results.len(),
            total_documents,
            "Ranked search results"
        );
        Ok(results)
    }

    fn score(
        &self,
        document: &'a Document,
        terms: &BTreeSet<Term>,
        total_documents: usize,
    ) -> SearchResult<'a> {
        let mut rank = 0.0;
        let mut stats = Vec::with_capacity(terms.len());
        for term in terms {
            let term_freq = document.term_frequency(term);
            let document_freq = self.index.document_frequency(term);
            rank += tf(term_freq, document.total_terms()) * idf(total_documents, document_freq);
            stats.push(TermStat {
                term: term.clone(),
                term_freq,
                document_freq,
            });
        }
        SearchResult {
            rank,
            document,
            stats,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn tf(term_freq: f64, total_terms: usize) -> f64 {
    if total_terms == 0 {
        0.0
    } else {
        term_freq / total_terms as f64
    }
}

#[allow(clippy::cast_precision_loss)]
fn idf(total_documents: usize, document_freq: f64) -> f64 {
    (total_documents as f64 / document_freq).log10()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> DocumentIndex {
        let mut index = DocumentIndex::new();
        index.add_document("cats.txt", "cats purr and cats sleep all day");
        index.add_document("dogs.txt", "dogs bark and dogs run in the park");
        index.add_document("pets.txt", "cats and dogs are popular pets");
        index
    }

    #[test]
    fn test_ranks_by_tf_idf() {
        let index = corpus();
        let results = RankedSearcher::new(&index).search("cat").unwrap();

        let paths: Vec<_> = results.iter().map(|r| r.path().to_path_buf()).collect();
        assert_eq!(paths, vec![Path::new("cats.txt"), Path::new("pets.txt")]);

        // tf = 2/7, idf = log10(3/2)
        let expected = (2.0 / 7.0) * (3.0_f64 / 2.0).log10();
        assert!((results[0].rank - expected).abs() < 1e-12);
        assert_eq!(results[0].stats.len(), 1);
        assert_eq!(results[0].stats[0].term, "cat");
    }

    #[test]
    fn test_term_in_every_document_scores_zero() {
        let index = corpus();
        let results = RankedSearcher::new(&index).search("and").unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.rank.abs() < f64::EPSILON));
        // equal ranks fall back to path order
        let paths: Vec<_> = results.iter().map(|r| r.path().to_str().unwrap()).collect();
        assert_eq!(paths, vec!["cats.txt", "dogs.txt", "pets.txt"]);
    }

    #[test]
    fn test_multi_term_query_deduplicates() {
        let index = corpus();
        let results = RankedSearcher::new(&index)
            .search("barking dogs dog park")
            .unwrap();
        assert_eq!(results[0].path(), Path::new("dogs.txt"));
        let terms: Vec<_> = results[0].stats.iter().map(|s| s.term.as_str()).collect();
        assert_eq!(terms, vec!["bark", "dog", "park"]);
    }

    #[test]
    fn test_limit() {
        let index = corpus();
        let results = RankedSearcher::new(&index)
            .with_limit(Some(1))
            .search("cats dogs")
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_no_matches() {
        let index = corpus();
        assert!(RankedSearcher::new(&index).search("giraffe").unwrap().is_empty());
    }

    #[test]
    fn test_empty_query() {
        let index = corpus();
        assert!(matches!(
            RankedSearcher::new(&index).search(" ?! "),
            Err(Error::EmptyQuery)
        ));
    }
}
