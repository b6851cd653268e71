//! Built-in self test.
//!
//! This is what the Homebrew formula's `test do` block runs: index a small
//! in-memory corpus and check that ranking puts the expected document first.

use crate::cli::CliError;
use ranked_searcher_index::{DocumentIndex, Highlighter, RankedSearcher, words};
use serde::Serialize;
use tracing::instrument;

const CORPUS: &[(&str, &str)] = &[
    (
        "install.md",
        "Install ranked-searcher with Homebrew. The formula downloads the archive, \
         checks its sha256 checksum and installs the binary.",
    ),
    (
        "ranking.md",
        "Documents are ranked with tf-idf. Term frequency counts how often a term \
         appears; inverse document frequency rewards rare terms across documents.",
    ),
    (
        "usage.md",
        "Run a search from any directory. Results show the most relevant file first \
         followed by the matching lines.",
    ),
];

const QUERY: &str = "ranking documents by term frequency";
const EXPECTED_TOP: &str = "ranking.md";

/// Outcome of the self test.
#[derive(Debug, Clone, Serialize)]
pub struct SmokeReport {
    /// Query that was run
    pub query: &'static str,
    /// Documents returned, best first
    pub ranking: Vec<String>,
    /// Lines of the top document that were highlighted
    pub highlighted_lines: usize,
}

/// Runs the self test.
///
/// # Errors
///
/// Returns a failure if ranking or highlighting does not behave as expected.
#[instrument]
pub fn execute_smoke_test() -> Result<SmokeReport, CliError> {
    let mut index = DocumentIndex::new();
    for (path, content) in CORPUS {
        index.add_document(*path, content);
    }

    let results = RankedSearcher::new(&index).search(QUERY)?;
    let ranking: Vec<String> = results
        .iter()
        .map(|r| r.path().display().to_string())
        .collect();

    if ranking.first().map(String::as_str) != Some(EXPECTED_TOP) {
        return Err(CliError::failed(format!(
            "self test expected {EXPECTED_TOP} first, got {ranking:?}"
        )));
    }
    if results.iter().any(|r| !r.rank.is_finite() || r.rank < 0.0) {
        return Err(CliError::failed("self test produced an invalid rank"));
    }

    let (_, top_content) = CORPUS
        .iter()
        .find(|(path, _)| *path == EXPECTED_TOP)
        .ok_or_else(|| CliError::other("self test corpus is missing its expected document"))?;
    let highlighted_lines = Highlighter::new(&words(QUERY))?
        .matching_lines_in(top_content)
        .len();
    if highlighted_lines == 0 {
        return Err(CliError::failed("self test found no lines to highlight"));
    }

    tracing::info!(?ranking, highlighted_lines, "Self test passed");
    Ok(SmokeReport {
        query: QUERY,
        ranking,
        highlighted_lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoke_test_passes() {
        let report = execute_smoke_test().unwrap();
        assert_eq!(report.ranking[0], EXPECTED_TOP);
        assert!(report.highlighted_lines > 0);
    }
}
