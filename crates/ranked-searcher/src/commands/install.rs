use crate::cli::CliError;
use ranked_searcher_homebrew::{Installer, parse_formula, smoke_test};
use ranked_searcher_release::Target;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Result of `install`.
#[derive(Debug, Clone, Serialize)]
pub struct InstallOutput {
    /// Installed version
    pub version: String,
    /// Target that was installed
    pub target: String,
    /// Installed executable
    pub binary: PathBuf,
    /// Verified archive checksum
    pub sha256: String,
    /// Whether the formula's test command ran and passed
    pub tested: bool,
}

impl fmt::Display for InstallOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Installed {} ({}) to {}",
            self.version,
            self.target,
            self.binary.display()
        )?;
        if self.tested {
            write!(f, "\nTest passed")?;
        }
        Ok(())
    }
}

/// Execute `install`.
///
/// # Errors
///
/// Returns an error if the formula cannot be parsed, there is no target for
/// this platform, the archive is missing or fails its checksum, or the
/// formula's test command fails.
#[instrument]
pub fn execute_install(
    formula: &Path,
    archive_dir: &Path,
    prefix: &Path,
    target: Option<Target>,
    skip_test: bool,
) -> Result<InstallOutput, CliError> {
    let source = std::fs::read_to_string(formula)
        .map_err(|e| CliError::config(format!("Failed to read {}: {e}", formula.display())))?;
    let data = parse_formula(&source)?;

    let target = target.or_else(Target::current).ok_or_else(|| {
        CliError::config_with_help(
            "This platform has no published release",
            "Pass --target macos-intel, macos-arm, or linux-intel",
        )
    })?;

    let receipt = Installer::new(prefix, archive_dir).install(&data, target)?;
    if !skip_test {
        smoke_test(&receipt, &data.test_args)?;
    }

    Ok(InstallOutput {
        version: receipt.version,
        target: receipt.target.to_string(),
        binary: receipt.binary_path,
        sha256: receipt.sha256,
        tested: !skip_test,
    })
}
