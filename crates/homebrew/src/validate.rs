//! Formula validation.
//!
//! [`FormulaValidator`] checks a single formula record; [`validate_history`]
//! checks that a sequence of records only ever moves the version forward; and
//! [`compare_shape`] checks that a rendered template and a handwritten formula
//! share the same layout once their string literals are blanked out.

use crate::error::{Error, Result};
use crate::formula::FormulaData;
use ranked_searcher_release::{ReleaseHistory, Target, Version, is_valid_sha256};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

/// How serious an [`Issue`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// The formula must not be published.
    Error,
    /// The formula is usable but probably not what was intended.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Severity of the finding
    pub severity: Severity,
    /// Target the finding applies to, if any
    pub target: Option<Target>,
    /// Human readable description
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target {
            Some(target) => write!(f, "{} [{target}]: {}", self.severity, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Findings for one formula.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    issues: Vec<Issue>,
}

impl ValidationReport {
    fn error(&mut self, target: Option<Target>, message: impl Into<String>) {
        self.issues.push(Issue {
            severity: Severity::Error,
            target,
            message: message.into(),
        });
    }

    fn warning(&mut self, target: Option<Target>, message: impl Into<String>) {
        self.issues.push(Issue {
            severity: Severity::Warning,
            target,
            message: message.into(),
        });
    }

    /// All findings in the order they were found.
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Returns true if there are no errors. Warnings do not count.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors().next().is_none()
    }

    /// Findings with [`Severity::Error`].
    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Error)
    }

    /// Findings with [`Severity::Warning`].
    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Warning)
    }

    /// Converts the report into an error if it holds any errors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] summarising every error finding.
    pub fn into_result(self) -> Result<()> {
        let errors: Vec<String> = self.errors().map(ToString::to_string).collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::validation(errors.join("; ")))
        }
    }
}

/// Validates formula records.
pub struct FormulaValidator;

impl FormulaValidator {
    /// Checks a formula record.
    #[must_use]
    pub fn validate(data: &FormulaData) -> ValidationReport {
        let mut report = ValidationReport::default();

        if let Err(e) = data.version.parse::<Version>() {
            report.error(None, e.to_string());
        }
        if !is_camel_case(&data.class_name) {
            report.error(
                None,
                format!("class name `{}` is not CamelCase", data.class_name),
            );
        }
        match Url::parse(&data.homepage) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => report.error(
                None,
                format!("homepage uses unsupported scheme `{}`", url.scheme()),
            ),
            Err(e) => report.error(None, format!("homepage `{}` is not a URL: {e}", data.homepage)),
        }

        for (field, value) in [
            ("class", &data.class_name),
            ("desc", &data.desc),
            ("homepage", &data.homepage),
            ("version", &data.version),
            ("binary", &data.binary_name),
        ] {
            if value.contains("{{") {
                report.error(None, format!("{field} still contains a `{{{{` placeholder"));
            }
        }

        if data.binaries.is_empty() {
            report.error(None, "formula has no platform binaries");
        }

        let mut seen: BTreeMap<String, Target> = BTreeMap::new();
        for (target, info) in &data.binaries {
            let target = *target;
            Self::check_url(&mut report, target, &info.url, &data.version);

            if info.sha256.contains("{{") {
                report.error(Some(target), "sha256 still contains a `{{` placeholder");
            } else if !is_valid_sha256(&info.sha256) {
                report.error(
                    Some(target),
                    format!("sha256 `{}` is not 64 hexadecimal characters", info.sha256),
                );
            } else if let Some(other) = seen.insert(info.sha256.to_ascii_lowercase(), target) {
                report.warning(Some(target), format!("sha256 is the same as {other}"));
            }
        }

        tracing::debug!(
            class = %data.class_name,
            version = %data.version,
            issues = report.issues.len(),
            "Validated formula"
        );
        report
    }

    fn check_url(report: &mut ValidationReport, target: Target, raw: &str, version: &str) {
        if raw.contains("{{") {
            report.error(Some(target), "url still contains a `{{` placeholder");
            return;
        }
        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(e) => {
                report.error(Some(target), format!("url `{raw}` is not valid: {e}"));
                return;
            }
        };
        if url.scheme() != "https" {
            report.error(
                Some(target),
                format!("url must use https, found `{}`", url.scheme()),
            );
        }
        if !version.is_empty() && !raw.contains(version) {
            report.warning(
                Some(target),
                format!("url does not mention version {version}"),
            );
        }
        let file_name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default();
        if !file_name.ends_with(".tar.gz") {
            report.warning(
                Some(target),
                format!("url file `{file_name}` is not a .tar.gz archive"),
            );
        }
    }
}

fn is_camel_case(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        && name.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Checks that formula records, in publication order, have strictly
/// increasing versions.
///
/// # Errors
///
/// Returns an error if a version cannot be parsed or does not follow the
/// previous record.
pub fn validate_history(records: &[(String, FormulaData)]) -> Result<ReleaseHistory> {
    let mut history = ReleaseHistory::new();
    for (label, data) in records {
        history.push_str(label.clone(), &data.version)?;
    }
    history.verify_monotonic()?;
    Ok(history)
}

/// The layout of a formula: every double-quoted literal emptied and trailing
/// whitespace removed from each line.
#[must_use]
pub fn shape(text: &str) -> String {
    text.lines()
        .map(|line| blank_literals(line).trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

fn blank_literals(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        out.push(c);
        if c != '"' {
            continue;
        }
        // skip to the closing quote
        while let Some(inner) = chars.next() {
            match inner {
                '\\' => {
                    chars.next();
                }
                '"' => {
                    out.push('"');
                    break;
                }
                _ => {}
            }
        }
    }
    out
}

/// Compares the layout of two formulas.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] describing the first line that differs.
pub fn compare_shape(expected: &str, actual: &str) -> Result<()> {
    let expected = shape(expected);
    let actual = shape(actual);
    let mut expected_lines = expected.lines();
    let mut actual_lines = actual.lines();

    let mut line = 0;
    loop {
        line += 1;
        match (expected_lines.next(), actual_lines.next()) {
            (None, None) => return Ok(()),
            (Some(e), Some(a)) if e == a => {}
            (e, a) => {
                return Err(Error::ShapeMismatch {
                    line,
                    expected: e.unwrap_or("<end of file>").to_string(),
                    actual: a.unwrap_or("<end of file>").to_string(),
                });
            }
        }
    }
}
