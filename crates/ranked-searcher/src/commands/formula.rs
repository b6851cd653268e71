//! Formula CLI commands.
//!
//! - `formula render` - fill a template with a version and checksums
//! - `formula generate` - build a formula from release.toml and CHECKSUMS.txt
//! - `formula validate` - parse formula files and check their records
//! - `formula history` - check that versions strictly increase
//! - `formula shape` - compare the layout of a formula with a template

use crate::cli::CliError;
use ranked_searcher_homebrew::{
    FormulaData, FormulaGenerator, FormulaTemplate, FormulaValidator, Issue, TemplateValues,
    compare_shape, parse_formula, validate_history,
};
use ranked_searcher_release::{ChecksumsManifest, ReleaseConfig, Target};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// A rendered or generated formula.
#[derive(Debug, Clone, Serialize)]
pub struct FormulaOutput {
    /// Release version
    pub version: String,
    /// File the formula was written to; `None` when it goes to stdout
    pub path: Option<PathBuf>,
    /// Formula text
    pub formula: String,
    /// Validation warnings
    pub warnings: Vec<String>,
}

impl fmt::Display for FormulaOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "Wrote formula {} to {}", self.version, path.display()),
            None => write!(f, "{}", self.formula.trim_end()),
        }
    }
}

fn read(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path)
        .map_err(|e| CliError::config(format!("Failed to read {}: {e}", path.display())))
}

fn write_output(path: &Path, content: &str) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            CliError::failed_with_help(
                format!("Failed to create {}: {e}", parent.display()),
                "Pass an --output path whose parent is a directory",
            )
        })?;
    }
    std::fs::write(path, content)
        .map_err(|e| CliError::failed(format!("Failed to write {}: {e}", path.display())))
}

fn warnings_of(data: &FormulaData) -> Result<Vec<String>, CliError> {
    let report = FormulaValidator::validate(data);
    let warnings: Vec<String> = report.warnings().map(Issue::to_string).collect();
    for warning in &warnings {
        warn!(%warning, "Formula warning");
    }
    report.into_result()?;
    Ok(warnings)
}

/// Execute `formula render`.
///
/// The template comes from `--template`, then `formula.template` in the
/// release config, then the built-in template. Checksums from `--sha256`
/// override those read from CHECKSUMS.txt.
///
/// # Errors
///
/// Returns an error if the template cannot be read, a placeholder has no
/// value, a value is malformed, or the rendered formula fails validation.
#[instrument(skip(config, overrides))]
pub fn execute_render(
    config: &ReleaseConfig,
    version: &str,
    template: Option<&Path>,
    checksums: Option<&Path>,
    overrides: &[(Target, String)],
    output: Option<&Path>,
) -> Result<FormulaOutput, CliError> {
    let template = match template {
        Some(path) => FormulaTemplate::load(path)?,
        None => FormulaTemplate::from_config(config)?,
    };

    let mut values = match checksums {
        Some(path) => TemplateValues::from_manifest(version, config, &ChecksumsManifest::load(path)?),
        None => TemplateValues::new(version),
    };
    for (target, sha256) in overrides {
        values = values.with_checksum(*target, sha256.clone());
    }

    let formula = template.render(&values)?;
    let warnings = warnings_of(&parse_formula(&formula)?)?;

    if let Some(path) = output {
        write_output(path, &formula)?;
        info!(path = %path.display(), version, "Rendered formula");
    }

    Ok(FormulaOutput {
        version: version.to_string(),
        path: output.map(Path::to_path_buf),
        formula,
        warnings,
    })
}

/// Execute `formula generate`.
///
/// Writes to `output`, or to `formula.output` from the release config.
///
/// # Errors
///
/// Returns an error if CHECKSUMS.txt is missing a configured target or the
/// generated formula fails validation.
#[instrument(skip(config))]
pub fn execute_generate(
    config: &ReleaseConfig,
    version: &str,
    checksums: &Path,
    output: Option<&Path>,
) -> Result<FormulaOutput, CliError> {
    let manifest = ChecksumsManifest::load(checksums)?;
    let data = FormulaData::from_config(config, version, &manifest)?;
    let warnings = warnings_of(&data)?;
    let formula = FormulaGenerator::generate(&data);

    let path = output.map_or_else(|| config.formula.output.clone(), Path::to_path_buf);
    write_output(&path, &formula)?;
    info!(path = %path.display(), version, targets = data.binaries.len(), "Generated formula");

    Ok(FormulaOutput {
        version: version.to_string(),
        path: Some(path),
        formula,
        warnings,
    })
}

/// Validation outcome for one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileValidation {
    /// Formula file
    pub path: PathBuf,
    /// Version the formula declares, if it parsed
    pub version: Option<String>,
    /// Errors found
    pub errors: Vec<String>,
    /// Warnings found
    pub warnings: Vec<String>,
}

/// Outcome of `formula validate`.
#[derive(Debug, Clone, Serialize)]
pub struct ValidateOutput {
    /// Per-file results, in argument order
    pub files: Vec<FileValidation>,
}

impl ValidateOutput {
    /// Number of errors across all files.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.files.iter().map(|f| f.errors.len()).sum()
    }
}

impl fmt::Display for ValidateOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, file) in self.files.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let status = if file.errors.is_empty() { "ok" } else { "invalid" };
            write!(f, "{}: {status}", file.path.display())?;
            if let Some(version) = &file.version {
                write!(f, " ({version})")?;
            }
            for issue in file.errors.iter().chain(&file.warnings) {
                write!(f, "\n  {issue}")?;
            }
        }
        Ok(())
    }
}

/// Execute `formula validate`.
///
/// Every file is checked even after one fails, so a single run reports
/// everything. The output is returned alongside the overall verdict.
///
/// # Errors
///
/// Returns an error only if a file cannot be read.
#[instrument]
pub fn execute_validate(files: &[PathBuf]) -> Result<ValidateOutput, CliError> {
    let mut results = Vec::with_capacity(files.len());
    for path in files {
        let source = read(path)?;
        let result = match parse_formula(&source) {
            Ok(data) => {
                let report = FormulaValidator::validate(&data);
                FileValidation {
                    path: path.clone(),
                    version: Some(data.version),
                    errors: report.errors().map(Issue::to_string).collect(),
                    warnings: report.warnings().map(Issue::to_string).collect(),
                }
            }
            Err(e) => FileValidation {
                path: path.clone(),
                version: None,
                errors: vec![CliError::from(e).to_string()],
                warnings: Vec::new(),
            },
        };
        results.push(result);
    }
    Ok(ValidateOutput { files: results })
}

/// Converts a failed validation into an error, keeping the report text.
///
/// # Errors
///
/// Returns a configuration error if any file has errors.
pub fn require_valid(output: &ValidateOutput) -> Result<(), CliError> {
    match output.error_count() {
        0 => Ok(()),
        1 => Err(CliError::config_with_help(
            "1 formula error",
            output.to_string(),
        )),
        n => Err(CliError::config_with_help(
            format!("{n} formula errors"),
            output.to_string(),
        )),
    }
}

/// Outcome of `formula history`.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryOutput {
    /// `(file, version)` in the order given
    pub releases: Vec<(String, String)>,
    /// Greatest version
    pub latest: Option<String>,
}

impl fmt::Display for HistoryOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, version) in &self.releases {
            writeln!(f, "{version:<12} {label}")?;
        }
        write!(
            f,
            "{} releases in order; latest {}",
            self.releases.len(),
            self.latest.as_deref().unwrap_or("-")
        )
    }
}

/// Execute `formula history`.
///
/// # Errors
///
/// Returns an error if a file cannot be parsed or the versions do not
/// strictly increase in the given order.
#[instrument]
pub fn execute_history(files: &[PathBuf]) -> Result<HistoryOutput, CliError> {
    let mut records = Vec::with_capacity(files.len());
    for path in files {
        let data = parse_formula(&read(path)?)?;
        records.push((path.display().to_string(), data));
    }

    let history = validate_history(&records)?;
    Ok(HistoryOutput {
        releases: history
            .entries()
            .iter()
            .map(|e| (e.label.clone(), e.version.to_string()))
            .collect(),
        latest: history.latest().map(|e| e.version.to_string()),
    })
}

/// Outcome of `formula shape`.
#[derive(Debug, Clone, Serialize)]
pub struct ShapeOutput {
    /// Formula with the expected layout
    pub expected: PathBuf,
    /// Formula that was checked
    pub actual: PathBuf,
}

impl fmt::Display for ShapeOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} has the same layout as {}",
            self.actual.display(),
            self.expected.display()
        )
    }
}

/// Execute `formula shape`.
///
/// # Errors
///
/// Returns an error describing the first differing line.
#[instrument]
pub fn execute_shape(expected: &Path, actual: &Path) -> Result<ShapeOutput, CliError> {
    compare_shape(&read(expected)?, &read(actual)?)?;
    Ok(ShapeOutput {
        expected: expected.to_path_buf(),
        actual: actual.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sha(c: char) -> String {
        c.to_string().repeat(64)
    }

    fn overrides() -> Vec<(Target, String)> {
        vec![
            (Target::MacosIntel, sha('a')),
            (Target::MacosArm, sha('b')),
            (Target::LinuxIntel, sha('c')),
        ]
    }

    #[test]
    fn test_render_to_stdout() {
        let config = ReleaseConfig::default();
        let out = execute_render(&config, "0.0.3", None, None, &overrides(), None).unwrap();
        assert!(out.path.is_none());
        assert!(out.formula.contains("version \"0.0.3\""));
        assert!(out.formula.contains(&format!("sha256 \"{}\"", sha('c'))));
        assert!(!out.formula.contains("{{"));
        assert_eq!(out.to_string(), out.formula.trim_end());
    }

    #[test]
    fn test_render_missing_checksum_fails() {
        let config = ReleaseConfig::default();
        let err =
            execute_render(&config, "0.0.3", None, None, &overrides()[..2], None).unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
    }

    #[test]
    fn test_render_from_checksums_file() {
        let temp = TempDir::new().unwrap();
        let config = ReleaseConfig::default();
        let mut manifest = ChecksumsManifest::new();
        for (target, sha256) in overrides() {
            manifest.add(config.archive_name("0.0.3", target), sha256);
        }
        let checksums = temp.path().join("CHECKSUMS.txt");
        manifest.write(&checksums).unwrap();
        let output = temp.path().join("Formula/ranked-searcher.rb");

        let out = execute_render(
            &config,
            "0.0.3",
            None,
            Some(&checksums),
            &[(Target::MacosArm, sha('d'))],
            Some(&output),
        )
        .unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        assert_eq!(written, out.formula);
        assert!(written.contains(&sha('d')));
        assert!(!written.contains(&sha('b')));
    }

    #[test]
    fn test_render_output_under_file_fails() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("Formula");
        std::fs::write(&blocker, "not a directory").unwrap();
        let config = ReleaseConfig::default();

        let err = execute_render(
            &config,
            "0.0.3",
            None,
            None,
            &overrides(),
            Some(&blocker.join("ranked-searcher.rb")),
        )
        .unwrap_err();
        match err {
            CliError::Failed { message, help } => {
                assert!(message.contains("Failed to create"));
                assert!(help.unwrap().contains("--output"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_generate_then_validate_history_and_shape() {
        let temp = TempDir::new().unwrap();
        let config = ReleaseConfig::default();
        let mut paths = Vec::new();
        for version in ["0.0.1", "0.0.2"] {
            let mut manifest = ChecksumsManifest::new();
            for (target, sha256) in overrides() {
                manifest.add(config.archive_name(version, target), sha256);
            }
            let checksums = temp.path().join(format!("CHECKSUMS-{version}.txt"));
            manifest.write(&checksums).unwrap();
            let output = temp.path().join(format!("{version}.rb"));
            execute_generate(&config, version, &checksums, Some(&output)).unwrap();
            paths.push(output);
        }

        let validated = execute_validate(&paths).unwrap();
        assert_eq!(validated.error_count(), 0);
        assert!(require_valid(&validated).is_ok());

        let history = execute_history(&paths).unwrap();
        assert_eq!(history.latest.as_deref(), Some("0.0.2"));

        let reversed: Vec<_> = paths.iter().rev().cloned().collect();
        let err = execute_history(&reversed).unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));

        assert!(execute_shape(&paths[0], &paths[1]).is_ok());
    }

    #[test]
    fn test_validate_reports_every_file() {
        let temp = TempDir::new().unwrap();
        let broken = temp.path().join("broken.rb");
        std::fs::write(&broken, "class Broken < Formula\n").unwrap();
        let rendered = temp.path().join("ok.rb");
        let config = ReleaseConfig::default();
        execute_render(&config, "0.0.2", None, None, &overrides(), Some(&rendered)).unwrap();

        let out = execute_validate(&[broken, rendered]).unwrap();
        assert_eq!(out.files.len(), 2);
        assert_eq!(out.files[0].version, None);
        assert!(!out.files[0].errors.is_empty());
        assert!(out.files[1].errors.is_empty());

        let err = require_valid(&out).unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
        assert!(out.to_string().contains("broken.rb: invalid"));
    }

    #[test]
    fn test_shape_mismatch() {
        let temp = TempDir::new().unwrap();
        let template = temp.path().join("template.rb");
        std::fs::write(&template, FormulaTemplate::builtin().source()).unwrap();
        let other = temp.path().join("other.rb");
        std::fs::write(&other, "class RankedSearcher < Formula\nend\n").unwrap();

        let err = execute_shape(&template, &other).unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
    }
}
