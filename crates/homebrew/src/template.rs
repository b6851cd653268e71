//! Formula templates.
//!
//! A template is a formula with `{{name}}` placeholders for the values that
//! change between releases: `{{version}}` and one `{{sha256_<target>}}` per
//! published target. Ruby's own `#{...}` interpolation uses single braces and
//! is never treated as a placeholder.

use crate::error::{Error, Result};
use ranked_searcher_release::{ChecksumsManifest, ReleaseConfig, Target, Version, is_valid_sha256};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

/// The formula template shipped with ranked-searcher.
const BUILTIN_TEMPLATE: &str = include_str!("../templates/ranked-searcher.rb");

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder pattern is valid")
});

/// A formula template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaTemplate {
    source: String,
}

impl FormulaTemplate {
    /// Creates a template from its source text.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// The built-in ranked-searcher template.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(BUILTIN_TEMPLATE)
    }

    /// Reads a template file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            Error::template(format!("Failed to read template {}: {e}", path.display()))
        })?;
        Ok(Self::new(source))
    }

    /// The template configured in `release.toml`, or the built-in one.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured template cannot be read.
    pub fn from_config(config: &ReleaseConfig) -> Result<Self> {
        config
            .formula
            .template
            .as_deref()
            .map_or_else(|| Ok(Self::builtin()), Self::load)
    }

    /// The raw template text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Distinct placeholder names in order of first appearance.
    #[must_use]
    pub fn placeholders(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for caps in PLACEHOLDER.captures_iter(&self.source) {
            let name = &caps[1];
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }

    /// Substitutes every placeholder.
    ///
    /// # Errors
    ///
    /// Returns a template error if a value is invalid, a placeholder has no
    /// value, or the output still contains `{{` (a malformed placeholder).
    pub fn render(&self, values: &TemplateValues) -> Result<String> {
        values.validate()?;
        let map = values.to_map();

        let missing: Vec<String> = self
            .placeholders()
            .into_iter()
            .filter(|name| !map.contains_key(name))
            .collect();
        if !missing.is_empty() {
            return Err(Error::missing_placeholders(missing));
        }

        let rendered = PLACEHOLDER.replace_all(&self.source, |caps: &Captures<'_>| {
            map.get(&caps[1]).cloned().unwrap_or_default()
        });

        if let Some(pos) = rendered.find("{{") {
            let line = rendered[..pos].matches('\n').count() + 1;
            return Err(Error::template(format!(
                "malformed placeholder on line {line}"
            )));
        }

        tracing::debug!(
            version = %values.version,
            placeholders = map.len(),
            "Rendered formula template"
        );
        Ok(rendered.into_owned())
    }
}

/// Values substituted into a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateValues {
    /// Release version.
    pub version: String,
    /// Checksum per target.
    pub checksums: BTreeMap<Target, String>,
}

impl TemplateValues {
    /// Creates values for a version with no checksums.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Self::default()
        }
    }

    /// Sets the checksum for a target.
    #[must_use]
    pub fn with_checksum(mut self, target: Target, sha256: impl Into<String>) -> Self {
        self.checksums.insert(target, sha256.into());
        self
    }

    /// Collects checksums for every target whose archive appears in the manifest.
    #[must_use]
    pub fn from_manifest(version: &str, config: &ReleaseConfig, manifest: &ChecksumsManifest) -> Self {
        let mut values = Self::new(version);
        for target in Target::all() {
            if let Some(sha256) = manifest.get(&config.archive_name(version, *target)) {
                values.checksums.insert(*target, sha256.to_string());
            }
        }
        values
    }

    /// Placeholder name to value.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::from([("version".to_string(), self.version.clone())]);
        for (target, sha256) in &self.checksums {
            map.insert(target.placeholder().to_string(), sha256.to_ascii_lowercase());
        }
        map
    }

    fn validate(&self) -> Result<()> {
        self.version.parse::<Version>()?;
        for (target, sha256) in &self.checksums {
            if !is_valid_sha256(sha256) {
                return Err(Error::template(format!(
                    "checksum for {target} is not 64 hexadecimal characters: `{sha256}`"
                )));
            }
        }
        Ok(())
    }
}
