use crate::cli::CliError;
use ranked_searcher_release::{Artifact, ArtifactBuilder, ChecksumsManifest, ReleaseConfig, Target, Version};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Name of the manifest collecting every archive checksum of a release.
pub const CHECKSUMS_FILE: &str = "CHECKSUMS.txt";

/// Result of packaging one binary.
#[derive(Debug, Clone, Serialize)]
pub struct PackageOutput {
    /// Target the archive is for
    pub target: String,
    /// Archive path
    pub archive: PathBuf,
    /// SHA-256 of the archive
    pub sha256: String,
    /// Manifest that now lists the archive
    pub checksums: PathBuf,
}

impl fmt::Display for PackageOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Packaged {} ({})\n  sha256: {}\n  checksums: {}",
            self.archive.display(),
            self.target,
            self.sha256,
            self.checksums.display()
        )
    }
}

/// Execute `package`.
///
/// Archives the binary as `<binary>-<version>-<os>-<arch>.tar.gz` in
/// `output_dir` and records its checksum in `CHECKSUMS.txt` there, replacing
/// any earlier entry for the same archive.
///
/// # Errors
///
/// Returns an error if the version is invalid, the binary cannot be read, or
/// the archive or manifest cannot be written.
#[instrument(skip(config))]
pub fn execute_package(
    config: &ReleaseConfig,
    binary: &Path,
    target: Target,
    version: &str,
    output_dir: &Path,
) -> Result<PackageOutput, CliError> {
    version.parse::<Version>()?;
    if !binary.is_file() {
        return Err(CliError::config_with_help(
            format!("Binary not found: {}", binary.display()),
            "Build the release binary first, e.g. cargo build --release",
        ));
    }

    let builder = ArtifactBuilder::new(output_dir, version, config.binary_name());
    let packaged = builder.package(&Artifact {
        target,
        binary_path: binary.to_path_buf(),
        name: config.binary_name().to_string(),
    })?;

    let checksums = output_dir.join(CHECKSUMS_FILE);
    let mut manifest = if checksums.exists() {
        ChecksumsManifest::load(&checksums)?
    } else {
        ChecksumsManifest::new()
    };
    manifest.merge(ChecksumsManifest::from_artifacts(std::slice::from_ref(&packaged)));
    manifest.write(&checksums)?;
    info!(
        checksums = %checksums.display(),
        entries = manifest.len(),
        "Updated checksums manifest"
    );

    Ok(PackageOutput {
        target: target.to_string(),
        archive: packaged.archive_path,
        sha256: packaged.sha256,
        checksums,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_package_updates_manifest() {
        let temp = TempDir::new().unwrap();
        let binary = temp.path().join("ranked-searcher");
        std::fs::write(&binary, b"binary").unwrap();
        let dist = temp.path().join("dist");
        let config = ReleaseConfig::default();

        let first = execute_package(&config, &binary, Target::LinuxIntel, "0.0.2", &dist).unwrap();
        assert!(first.archive.ends_with("ranked-searcher-0.0.2-linux-x86_64.tar.gz"));
        execute_package(&config, &binary, Target::MacosArm, "0.0.2", &dist).unwrap();
        // repackaging replaces the entry rather than adding one
        execute_package(&config, &binary, Target::LinuxIntel, "0.0.2", &dist).unwrap();

        let manifest = ChecksumsManifest::load(&dist.join(CHECKSUMS_FILE)).unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(
            manifest.get("ranked-searcher-0.0.2-linux-x86_64.tar.gz"),
            Some(first.sha256.as_str())
        );
    }

    #[test]
    fn test_package_rejects_bad_input() {
        let temp = TempDir::new().unwrap();
        let config = ReleaseConfig::default();
        let missing = temp.path().join("missing");

        let err = execute_package(&config, &missing, Target::LinuxIntel, "0.0.2", temp.path())
            .unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));

        let err = execute_package(&config, &missing, Target::LinuxIntel, "one", temp.path())
            .unwrap_err();
        assert!(err.to_string().contains("one"));
    }
}
