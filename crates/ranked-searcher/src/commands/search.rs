use crate::cli::CliError;
use crossterm::style::Stylize;
use ranked_searcher_index::{
    DocumentIndex, Highlighter, IndexStats, MatchedLine, RankedSearcher, SearchResult, words,
};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Options for a search run.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Directory to index
    pub dir: PathBuf,
    /// Maximum number of results
    pub limit: Option<usize>,
    /// Print per-term statistics
    pub stats: bool,
    /// Print matching lines
    pub highlight: bool,
    /// Style output with ANSI colors
    pub color: bool,
}

/// One ranked file, as reported to the user.
#[derive(Debug, Clone, Serialize)]
pub struct ResultReport {
    /// File path
    pub path: PathBuf,
    /// tf-idf rank
    pub rank: f64,
    /// Per-term statistics
    pub stats: Vec<TermReport>,
    /// Lines containing a query word
    pub lines: Vec<LineReport>,
}

/// Statistics for one query term.
#[derive(Debug, Clone, Serialize)]
pub struct TermReport {
    /// Stemmed term
    pub term: String,
    /// Occurrences in the file
    pub term_freq: f64,
    /// Files containing the term
    pub document_freq: f64,
}

/// A matching line.
#[derive(Debug, Clone, Serialize)]
pub struct LineReport {
    /// 1-based line number
    pub number: usize,
    /// Line text
    pub text: String,
}

/// Everything a search produced.
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    /// The query as given
    pub query: String,
    /// Files indexed
    pub files_indexed: usize,
    /// Files skipped as unreadable
    pub files_skipped: usize,
    /// Ranked results, best first
    pub results: Vec<ResultReport>,
    #[serde(skip)]
    matched: Vec<Vec<MatchedLine>>,
}

/// Indexes `options.dir` and ranks its files against `query`.
///
/// # Errors
///
/// Returns an error if the directory cannot be indexed or the query has no
/// words.
#[instrument(skip(options), fields(dir = %options.dir.display()))]
pub fn execute_search(query: &[String], options: &SearchOptions) -> Result<SearchReport, CliError> {
    let query = query.join(" ");
    let mut index = DocumentIndex::new();
    let IndexStats {
        files_indexed,
        files_skipped,
        ..
    } = index.index_dir(&options.dir)?;

    let results = RankedSearcher::new(&index)
        .with_limit(options.limit)
        .search(&query)?;

    let highlighter = if options.highlight {
        Some(Highlighter::new(&words(&query))?)
    } else {
        None
    };

    let mut reports = Vec::with_capacity(results.len());
    let mut matched = Vec::with_capacity(results.len());
    for result in &results {
        let lines = match &highlighter {
            Some(highlighter) => highlighter.matching_lines(result.path())?,
            None => Vec::new(),
        };
        reports.push(result_report(result, &lines));
        matched.push(lines);
    }

    Ok(SearchReport {
        query,
        files_indexed,
        files_skipped,
        results: reports,
        matched,
    })
}

fn result_report(result: &SearchResult<'_>, lines: &[MatchedLine]) -> ResultReport {
    ResultReport {
        path: result.path().to_path_buf(),
        rank: result.rank,
        stats: result
            .stats
            .iter()
            .map(|s| TermReport {
                term: s.term.clone(),
                term_freq: s.term_freq,
                document_freq: s.document_freq,
            })
            .collect(),
        lines: lines
            .iter()
            .map(|l| LineReport {
                number: l.number,
                text: l.text.clone(),
            })
            .collect(),
    }
}

/// Renders a report as text.
#[must_use]
pub fn render_text(report: &SearchReport, options: &SearchOptions) -> String {
    let mut out = String::new();
    if report.results.is_empty() {
        let _ = writeln!(out, "No results for \"{}\"", report.query);
        return out;
    }

    for (result, lines) in report.results.iter().zip(&report.matched) {
        let path = display_path(&result.path, &options.dir);
        if options.color {
            let _ = writeln!(out, "{} {}", format!("{:.6}", result.rank).dim(), path.bold());
        } else {
            let _ = writeln!(out, "{:.6} {path}", result.rank);
        }

        if options.stats {
            let _ = writeln!(out, "  {:<15} | {:>10} | {:>10}", "Term", "Frequency", "Documents");
            let _ = writeln!(out, "  {:-<15}-+-{:-<10}-+-{:-<10}", "", "", "");
            for stat in &result.stats {
                let _ = writeln!(
                    out,
                    "  {:<15} | {:>10} | {:>10}",
                    stat.term, stat.term_freq, stat.document_freq
                );
            }
        }

        for line in lines {
            let _ = writeln!(out, "{}", highlight_line(line, options.color));
        }
        if options.highlight && !lines.is_empty() {
            out.push('\n');
        }
    }
    out
}

fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

/// `number:text` with matches styled bold blue and the number yellow.
fn highlight_line(line: &MatchedLine, color: bool) -> String {
    if !color {
        return format!("{}:{}", line.number, line.text);
    }

    let mut out = format!("{}:", line.number.to_string().yellow());
    let mut last = 0;
    for span in &line.spans {
        out.push_str(&line.text[last..span.start]);
        out.push_str(&line.text[span.clone()].blue().bold().to_string());
        last = span.end;
    }
    out.push_str(&line.text[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn options(dir: &Path) -> SearchOptions {
        SearchOptions {
            dir: dir.to_path_buf(),
            limit: None,
            stats: true,
            highlight: true,
            color: false,
        }
    }

    fn fixture() -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("cats.txt"), "cats purr\ncats sleep all day\n").unwrap();
        fs::write(temp.path().join("dogs.txt"), "dogs bark\nat cats sometimes\n").unwrap();
        fs::write(temp.path().join("fish.txt"), "fish swim\n").unwrap();
        temp
    }

    #[test]
    fn test_search_ranks_and_highlights() {
        let temp = fixture();
        let opts = options(temp.path());
        let report = execute_search(&["cats".to_string()], &opts).unwrap();

        assert_eq!(report.files_indexed, 3);
        assert_eq!(report.results.len(), 2);
        assert!(report.results[0].path.ends_with("cats.txt"));
        assert_eq!(report.results[0].lines.len(), 2);
        assert_eq!(report.results[1].lines[0].number, 2);

        let text = render_text(&report, &opts);
        assert!(text.contains(" cats.txt\n"));
        assert!(text.contains("1:cats purr"));
        assert!(text.contains("Frequency"));
    }

    #[test]
    fn test_search_without_highlight() {
        let temp = fixture();
        let mut opts = options(temp.path());
        opts.highlight = false;
        opts.limit = Some(1);
        let report = execute_search(&["cats".to_string()], &opts).unwrap();
        assert_eq!(report.results.len(), 1);
        assert!(report.results[0].lines.is_empty());
    }

    #[test]
    fn test_no_results() {
        let temp = fixture();
        let opts = options(temp.path());
        let report = execute_search(&["giraffe".to_string()], &opts).unwrap();
        assert!(render_text(&report, &opts).contains("No results"));
    }

    #[test]
    fn test_highlight_line_plain_and_colored() {
        let line = MatchedLine {
            number: 4,
            text: "a cat here".to_string(),
            spans: vec![2..5],
        };
        assert_eq!(highlight_line(&line, false), "4:a cat here");
        let colored = highlight_line(&line, true);
        assert!(colored.contains("cat"));
        assert!(colored.contains('\u{1b}'));
    }
}
