//! Tokenizer for documents and queries.

use rust_stemmers::{Algorithm, Stemmer};

/// Splits text into words.
///
/// Anything that is not a letter or digit separates words. A word starting
/// with a digit is a run of digits; a word starting with a letter is a run of
/// letters and digits, lowercased. Iterating yields English stems.
pub struct Lexer<'a> {
    content: &'a [char],
    stemmer: Stemmer,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer over `content`.
    #[must_use]
    pub fn new(content: &'a [char]) -> Self {
        Self {
            content,
            stemmer: Stemmer::create(Algorithm::English),
        }
    }

    fn skip_separators(&mut self) {
        let n = self
            .content
            .iter()
            .take_while(|c| !c.is_alphanumeric())
            .count();
        self.content = &self.content[n..];
    }

    fn take_while(&mut self, predicate: impl Fn(&char) -> bool) -> &'a [char] {
        let n = self.content.iter().take_while(|c| predicate(c)).count();
        let (token, rest) = self.content.split_at(n);
        self.content = rest;
        token
    }

    /// The next word as written, lowercased but not stemmed.
    pub fn next_word(&mut self) -> Option<String> {
        self.skip_separators();
        let first = *self.content.first()?;

        if first.is_numeric() {
            return Some(self.take_while(|c| c.is_numeric()).iter().collect());
        }

        Some(
            self.take_while(|c| c.is_alphanumeric())
                .iter()
                .map(char::to_ascii_lowercase)
                .collect(),
        )
    }

    /// The next word reduced to its stem.
    pub fn next_term(&mut self) -> Option<String> {
        let word = self.next_word()?;
        Some(self.stemmer.stem(&word).into_owned())
    }
}

impl Iterator for Lexer<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_term()
    }
}

/// Stemmed terms of `text`.
#[must_use]
pub fn terms(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    Lexer::new(&chars).collect()
}

/// Unstemmed words of `text`.
#[must_use]
pub fn words(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut lexer = Lexer::new(&chars);
    std::iter::from_fn(|| lexer.next_word()).collect()
}
