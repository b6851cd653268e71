//! Release history ordering checks.
//!
//! A formula record is never edited after release; each new version
//! supersedes the previous record. [`ReleaseHistory`] holds the records in
//! the order they were published and checks that versions only move forward.

use crate::error::{Error, Result};
use crate::version::Version;

/// One published release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseEntry {
    /// Where the release came from (file path, tag, ...).
    pub label: String,
    /// The released version.
    pub version: Version,
}

/// Releases in publication order.
#[derive(Debug, Clone, Default)]
pub struct ReleaseHistory {
    entries: Vec<ReleaseEntry>,
}

impl ReleaseHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a release.
    pub fn push(&mut self, label: impl Into<String>, version: Version) {
        self.entries.push(ReleaseEntry {
            label: label.into(),
            version,
        });
    }

    /// Appends a release given as a version string.
    ///
    /// # Errors
    ///
    /// Returns an error if the version cannot be parsed.
    pub fn push_str(&mut self, label: impl Into<String>, version: &str) -> Result<()> {
        let version = version.parse()?;
        self.push(label, version);
        Ok(())
    }

    /// Entries in publication order.
    #[must_use]
    pub fn entries(&self) -> &[ReleaseEntry] {
        &self.entries
    }

    /// Number of releases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no releases were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The release with the greatest version.
    #[must_use]
    pub fn latest(&self) -> Option<&ReleaseEntry> {
        self.entries.iter().max_by(|a, b| a.version.cmp(&b.version))
    }

    /// Entries sorted by version, oldest first.
    #[must_use]
    pub fn sorted(&self) -> Vec<&ReleaseEntry> {
        let mut sorted: Vec<_> = self.entries.iter().collect();
        sorted.sort_by(|a, b| a.version.cmp(&b.version));
        sorted
    }

    /// Checks that every release has a strictly greater version than the one
    /// published before it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::History`] naming the first offending pair.
    pub fn verify_monotonic(&self) -> Result<()> {
        for pair in self.entries.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.version <= prev.version {
                return Err(Error::history(format!(
                    "{} ({}) does not follow {} ({})",
                    next.version, next.label, prev.version, prev.label
                )));
            }
        }
        tracing::debug!(releases = self.entries.len(), "Release history is monotonic");
        Ok(())
    }
}
