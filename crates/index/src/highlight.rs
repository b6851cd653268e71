//! Query highlighting.

use crate::error::{Error, Result};
use regex::{Regex, RegexBuilder};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::Range;
use std::path::Path;

/// A line containing at least one query word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedLine {
    /// 1-based line number
    pub number: usize,
    /// Line text without its terminator
    pub text: String,
    /// Byte ranges of the matches within `text`
    pub spans: Vec<Range<usize>>,
}

/// Finds query words in text, ignoring case.
#[derive(Debug, Clone)]
pub struct Highlighter {
    pattern: Regex,
}

impl Highlighter {
    /// Builds a highlighter matching any of `words` literally.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyQuery`] if `words` is empty.
    pub fn new<S: AsRef<str>>(words: &[S]) -> Result<Self> {
        if words.is_empty() {
            return Err(Error::EmptyQuery);
        }
        let alternation = words
            .iter()
            .map(|w| regex::escape(w.as_ref()))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = RegexBuilder::new(&alternation)
            .case_insensitive(true)
            .build()?;
        Ok(Self { pattern })
    }

    /// Match ranges in a single line.
    #[must_use]
    pub fn spans(&self, line: &str) -> Vec<Range<usize>> {
        self.pattern.find_iter(line).map(|m| m.range()).collect()
    }

    /// Lines of `text` with at least one match.
    #[must_use]
    pub fn matching_lines_in(&self, text: &str) -> Vec<MatchedLine> {
        text.lines()
            .enumerate()
            .filter_map(|(index, line)| self.matched(index, line.to_string()))
            .collect()
    }

    /// Lines of the file at `path` with at least one match.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn matching_lines(&self, path: &Path) -> Result<Vec<MatchedLine>> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let mut lines = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| Error::io(path, e))?;
            lines.extend(self.matched(index, line));
        }
        Ok(lines)
    }

    fn matched(&self, index: usize, text: String) -> Option<MatchedLine> {
        let spans = self.spans(&text);
        if spans.is_empty() {
            return None;
        }
        Some(MatchedLine {
            number: index + 1,
            text,
            spans,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_case_insensitive_matches() {
        let highlighter = Highlighter::new(&["rust", "fast"]).unwrap();
        let lines = highlighter.matching_lines_in("Rust is FAST\nnothing here\nrusty");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].number, 1);
        assert_eq!(lines[0].spans, vec![0..4, 8..12]);
        assert_eq!(lines[1].number, 3);
        assert_eq!(lines[1].spans, vec![0..4]);
    }

    #[test]
    fn test_words_are_escaped() {
        let highlighter = Highlighter::new(&["a.b"]).unwrap();
        assert!(highlighter.spans("axb").is_empty());
        assert_eq!(highlighter.spans("a.b"), vec![0..3]);
    }

    #[test]
    fn test_matching_lines_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.txt");
        std::fs::write(&path, "first\nsecond match\nthird\n").unwrap();

        let lines = Highlighter::new(&["match"]).unwrap().matching_lines(&path).unwrap();
        assert_eq!(
            lines,
            vec![MatchedLine {
                number: 2,
                text: "second match".to_string(),
                spans: vec![7..12],
            }]
        );
    }

    #[test]
    fn test_empty_words() {
        let words: [&str; 0] = [];
        assert!(matches!(Highlighter::new(&words), Err(Error::EmptyQuery)));
    }

    #[test]
    fn test_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = Highlighter::new(&["x"])
            .unwrap()
            .matching_lines(&temp.path().join("missing"))
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
