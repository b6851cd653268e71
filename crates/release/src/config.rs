//! Release configuration types.
//!
//! The release configuration lives in `release.toml` at the project root and
//! describes how archives are named, where they are published, and how the
//! Homebrew formula is produced. Every field has a default that matches the
//! `ranked-searcher` project, so a missing file is not an error when loaded
//! with [`ReleaseConfig::load_or_default`].

use crate::artifact::{Target, archive_name};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default download URL layout for GitHub releases.
pub const DEFAULT_URL_TEMPLATE: &str = "{homepage}/releases/download/{version}/{archive}";

/// Complete release configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseConfig {
    /// Project metadata.
    pub project: ProjectConfig,
    /// Release artifact settings.
    pub release: ReleaseSettings,
    /// Formula generation settings.
    pub formula: FormulaConfig,
}

/// Project metadata shown in the formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Project name (e.g., "ranked-searcher").
    pub name: String,
    /// One-line description.
    pub desc: String,
    /// Project homepage URL.
    pub homepage: String,
    /// License identifier; omitted from the formula when unset.
    pub license: Option<String>,
    /// Executable name; defaults to the project name.
    pub binary: Option<String>,
    /// Formula class name; derived from the project name when unset.
    pub class_name: Option<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "ranked-searcher".to_string(),
            desc: "Search inside text files using tf-idf formula, showing the most relevant search at the top".to_string(),
            homepage: "https://github.com/larscom/ranked-searcher".to_string(),
            license: None,
            binary: None,
            class_name: None,
        }
    }
}

/// Release artifact settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseSettings {
    /// Download URL template.
    ///
    /// Supports `{homepage}`, `{version}`, `{archive}`, `{os}` and `{arch}`.
    pub url_template: String,
    /// Targets published for every release, by short id.
    pub targets: Vec<String>,
}

impl Default for ReleaseSettings {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            targets: Target::all().iter().map(|t| t.short_id().to_string()).collect(),
        }
    }
}

/// Formula generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormulaConfig {
    /// Template file; the built-in template is used when unset.
    pub template: Option<PathBuf>,
    /// Where the generated formula is written.
    pub output: PathBuf,
    /// Arguments passed to the installed binary by the formula's test block.
    pub test_args: Vec<String>,
}

impl Default for FormulaConfig {
    fn default() -> Self {
        Self {
            template: None,
            output: PathBuf::from("Formula.rb"),
            test_args: vec!["test".to_string()],
        }
    }
}

impl ReleaseConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or names an unknown target.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.targets()?;
        Ok(config)
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(
                format!("Failed to read {}: {e}", path.display()),
                "Pass --config with the path to release.toml",
            )
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), project = %config.project.name, "Loaded release config");
        Ok(config)
    }

    /// Loads a configuration file, falling back to defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "No release config found, using defaults");
            Ok(Self::default())
        }
    }

    /// Name of the installed executable.
    #[must_use]
    pub fn binary_name(&self) -> &str {
        self.project.binary.as_deref().unwrap_or(&self.project.name)
    }

    /// Formula class name.
    #[must_use]
    pub fn class_name(&self) -> String {
        self.project
            .class_name
            .clone()
            .unwrap_or_else(|| class_name_for(&self.project.name))
    }

    /// Configured targets, in formula order.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for unknown or duplicate target names.
    pub fn targets(&self) -> Result<Vec<Target>> {
        let mut targets = Vec::with_capacity(self.release.targets.len());
        for name in &self.release.targets {
            let target: Target = name.parse().map_err(|_| {
                Error::config(
                    format!("Unknown target `{name}` in release.targets"),
                    "Valid targets: macos-intel, macos-arm, linux-intel",
                )
            })?;
            if targets.contains(&target) {
                return Err(Error::config(
                    format!("Target `{name}` is listed twice in release.targets"),
                    "Each target maps to exactly one download",
                ));
            }
            targets.push(target);
        }
        targets.sort();
        Ok(targets)
    }

    /// Archive name for a version and target.
    #[must_use]
    pub fn archive_name(&self, version: &str, target: Target) -> String {
        archive_name(self.binary_name(), version, target)
    }

    /// Download URL for a version and target.
    #[must_use]
    pub fn download_url(&self, version: &str, target: Target) -> String {
        self.release
            .url_template
            .replace("{homepage}", self.project.homepage.trim_end_matches('/'))
            .replace("{version}", version)
            .replace("{archive}", &self.archive_name(version, target))
            .replace("{os}", target.os())
            .replace("{arch}", target.arch())
    }
}

/// Derives a Ruby class name from a project name.
///
/// `ranked-searcher` becomes `RankedSearcher`.
#[must_use]
pub fn class_name_for(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + chars.as_str()
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReleaseConfig::default();
        assert_eq!(config.binary_name(), "ranked-searcher");
        assert_eq!(config.class_name(), "RankedSearcher");
        assert_eq!(config.targets().unwrap(), Target::all());
        assert_eq!(config.formula.test_args, vec!["test"]);
    }

    #[test]
    fn test_download_url() {
        let config = ReleaseConfig::default();
        assert_eq!(
            config.download_url("0.0.2", Target::MacosArm),
            "https://github.com/larscom/ranked-searcher/releases/download/0.0.2/ranked-searcher-0.0.2-macos-arm64.tar.gz"
        );
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = ReleaseConfig::from_toml_str(
            r#"
[project]
name = "my-tool"
homepage = "https://example.com/my-tool/"

[release]
targets = ["linux-intel", "macos-arm"]
"#,
        )
        .unwrap();

        assert_eq!(config.class_name(), "MyTool");
        assert_eq!(config.targets().unwrap(), vec![Target::MacosArm, Target::LinuxIntel]);
        assert_eq!(
            config.download_url("1.0.0", Target::LinuxIntel),
            "https://example.com/my-tool/releases/download/1.0.0/my-tool-1.0.0-linux-x86_64.tar.gz"
        );
        assert_eq!(config.formula.output, PathBuf::from("Formula.rb"));
    }

    #[test]
    fn test_unknown_target_rejected() {
        let err = ReleaseConfig::from_toml_str("[release]\ntargets = [\"windows\"]\n").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_duplicate_target_rejected() {
        let err = ReleaseConfig::from_toml_str(
            "[release]\ntargets = [\"linux-intel\", \"x86_64-unknown-linux-gnu\"]\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("listed twice"));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            ReleaseConfig::from_toml_str("[project\nname = 1"),
            Err(Error::TomlParse(_))
        ));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = ReleaseConfig::load_or_default(&temp.path().join("release.toml")).unwrap();
        assert_eq!(config, ReleaseConfig::default());
    }

    #[test]
    fn test_class_name_for() {
        assert_eq!(class_name_for("ranked-searcher"), "RankedSearcher");
        assert_eq!(class_name_for("ripgrep"), "Ripgrep");
        assert_eq!(class_name_for("foo_bar-baz"), "FooBarBaz");
    }
}
