//! Local formula installation.
//!
//! Performs the install contract of a formula against archives that are
//! already on disk: pick the archive for the running platform, verify its
//! checksum, copy the binary into `<prefix>/bin`, then run the formula's
//! test command against it.

use crate::error::{Error, Result};
use crate::formula::FormulaData;
use flate2::read::GzDecoder;
use ranked_searcher_release::{Target, verify_sha256};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use tar::Archive;
use tracing::{debug, info};
use url::Url;

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReceipt {
    /// Installed version
    pub version: String,
    /// Platform the archive was built for
    pub target: Target,
    /// Path of the installed executable
    pub binary_path: PathBuf,
    /// Verified checksum of the archive
    pub sha256: String,
}

/// Installs formula binaries from a directory of release archives.
#[derive(Debug, Clone)]
pub struct Installer {
    prefix: PathBuf,
    archive_dir: PathBuf,
}

impl Installer {
    /// Creates an installer writing below `prefix` and reading archives from
    /// `archive_dir`.
    #[must_use]
    pub fn new(prefix: impl Into<PathBuf>, archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            archive_dir: archive_dir.into(),
        }
    }

    /// Directory executables are installed into.
    #[must_use]
    pub fn bin_dir(&self) -> PathBuf {
        self.prefix.join("bin")
    }

    /// Installs the formula's binary for `target`.
    ///
    /// Nothing is written below the prefix unless the archive checksum
    /// matches the formula.
    ///
    /// # Errors
    ///
    /// Returns an error if the formula has no binary for `target`, the archive
    /// is missing or fails checksum verification, or the archive does not
    /// contain the executable.
    pub fn install(&self, formula: &FormulaData, target: Target) -> Result<InstallReceipt> {
        let info = formula.binaries.get(&target).ok_or_else(|| {
            Error::install(
                format!("formula {} has no binary for {target}", formula.version),
                None,
            )
        })?;

        let archive_path = self.locate_archive(&info.url)?;
        verify_sha256(&archive_path, &info.sha256)?;
        debug!(archive = %archive_path.display(), %target, "Archive checksum verified");

        let bin_dir = self.bin_dir();
        fs::create_dir_all(&bin_dir)?;
        let binary_path = bin_dir.join(&formula.binary_name);
        extract_binary(&archive_path, &formula.binary_name, &binary_path)?;

        info!(
            version = %formula.version,
            %target,
            path = %binary_path.display(),
            "Installed binary"
        );

        Ok(InstallReceipt {
            version: formula.version.clone(),
            target,
            binary_path,
            sha256: info.sha256.to_ascii_lowercase(),
        })
    }

    /// Finds the archive named by the last path segment of `url`; query
    /// strings and fragments are not part of the name.
    fn locate_archive(&self, url: &str) -> Result<PathBuf> {
        let parsed = Url::parse(url)
            .map_err(|e| Error::install(format!("invalid url `{url}`: {e}"), None))?;
        let file_name = parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::install(format!("url `{url}` has no file name"), None))?;

        let path = self.archive_dir.join(file_name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(Error::install(
                format!("archive {file_name} not found in {}", self.archive_dir.display()),
                Some(path),
            ))
        }
    }
}

/// Copies the entry named `binary_name` out of a gzip tarball.
fn extract_binary(archive_path: &Path, binary_name: &str, dest: &Path) -> Result<()> {
    let file = File::open(archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(file));

    for entry in archive.entries()? {
        let mut entry = entry?;
        let is_binary = {
            let path = entry.path()?;
            path.file_name().is_some_and(|name| name == binary_name)
        };
        if !is_binary || !entry.header().entry_type().is_file() {
            continue;
        }

        let mut out = File::create(dest)?;
        io::copy(&mut entry, &mut out)?;
        set_executable(dest)?;
        return Ok(());
    }

    Err(Error::install(
        format!("{} does not contain `{binary_name}`", archive_path.display()),
        Some(archive_path.to_path_buf()),
    ))
}

#[cfg(unix)]
fn set_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// Runs the installed binary with the formula's test arguments.
///
/// # Errors
///
/// Returns [`Error::SmokeTest`] if the binary cannot be started or exits
/// unsuccessfully.
pub fn smoke_test(receipt: &InstallReceipt, args: &[String]) -> Result<()> {
    debug!(binary = %receipt.binary_path.display(), ?args, "Running smoke test");
    let output = Command::new(&receipt.binary_path)
        .args(args)
        .output()
        .map_err(|e| {
            Error::smoke_test(
                format!("failed to run {}: {e}", receipt.binary_path.display()),
                None,
                String::new(),
            )
        })?;

    if output.status.success() {
        info!(version = %receipt.version, "Smoke test passed");
        Ok(())
    } else {
        Err(Error::smoke_test(
            format!(
                "{} {} exited with {}",
                receipt.binary_path.display(),
                args.join(" "),
                output.status
            ),
            output.status.code(),
            String::from_utf8_lossy(&output.stderr),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::BinaryInfo;
    use ranked_searcher_release::compute_sha256;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    const SCRIPT: &[u8] = b"#!/bin/sh\nexit 0\n";

    fn write_archive(dir: &Path, name: &str, entry: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let encoder = flate2::write::GzEncoder::new(
            File::create(&path).unwrap(),
            flate2::Compression::default(),
        );
        let mut builder = tar::Builder::new(encoder);
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append_data(&mut header, entry, content).unwrap();
        builder.into_inner().unwrap().finish().unwrap();
        path
    }

    fn formula_for(archive: &Path, target: Target) -> FormulaData {
        let name = archive.file_name().unwrap().to_str().unwrap();
        let mut binaries = BTreeMap::new();
        binaries.insert(
            target,
            BinaryInfo {
                url: format!("https://example.com/releases/download/0.0.2/{name}"),
                sha256: compute_sha256(archive).unwrap(),
            },
        );
        FormulaData {
            class_name: "RankedSearcher".to_string(),
            desc: String::new(),
            homepage: "https://example.com".to_string(),
            version: "0.0.2".to_string(),
            license: None,
            binary_name: "ranked-searcher".to_string(),
            test_args: vec!["test".to_string()],
            binaries,
        }
    }

    #[test]
    fn test_install_extracts_binary() {
        let archives = TempDir::new().unwrap();
        let prefix = TempDir::new().unwrap();
        let archive = write_archive(
            archives.path(),
            "ranked-searcher-0.0.2-linux-x86_64.tar.gz",
            "ranked-searcher",
            SCRIPT,
        );
        let formula = formula_for(&archive, Target::LinuxIntel);

        let receipt = Installer::new(prefix.path(), archives.path())
            .install(&formula, Target::LinuxIntel)
            .unwrap();

        assert_eq!(receipt.binary_path, prefix.path().join("bin/ranked-searcher"));
        assert_eq!(fs::read(&receipt.binary_path).unwrap(), SCRIPT);
        assert_eq!(receipt.version, "0.0.2");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&receipt.binary_path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test]
    fn test_checksum_mismatch_writes_nothing() {
        let archives = TempDir::new().unwrap();
        let prefix = TempDir::new().unwrap();
        let archive = write_archive(archives.path(), "a.tar.gz", "ranked-searcher", SCRIPT);
        let mut formula = formula_for(&archive, Target::MacosArm);
        formula.binaries.get_mut(&Target::MacosArm).unwrap().sha256 = "0".repeat(64);

        let err = Installer::new(prefix.path(), archives.path())
            .install(&formula, Target::MacosArm)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Release(ranked_searcher_release::Error::ChecksumMismatch { .. })
        ));
        assert!(!prefix.path().join("bin").exists());
    }

    #[test]
    fn test_missing_target_and_archive() {
        let archives = TempDir::new().unwrap();
        let prefix = TempDir::new().unwrap();
        let archive = write_archive(archives.path(), "a.tar.gz", "ranked-searcher", SCRIPT);
        let formula = formula_for(&archive, Target::MacosArm);
        let installer = Installer::new(prefix.path(), archives.path());

        let err = installer.install(&formula, Target::LinuxIntel).unwrap_err();
        assert!(err.to_string().contains("no binary for linux-intel"));

        fs::remove_file(&archive).unwrap();
        let err = installer.install(&formula, Target::MacosArm).unwrap_err();
        assert!(err.to_string().contains("archive a.tar.gz not found"));
    }

    #[test]
    fn test_archive_located_by_url_path() {
        let archives = TempDir::new().unwrap();
        let prefix = TempDir::new().unwrap();
        let archive = write_archive(
            archives.path(),
            "ranked-searcher-0.0.2-linux-x86_64.tar.gz",
            "ranked-searcher",
            SCRIPT,
        );
        let mut formula = formula_for(&archive, Target::LinuxIntel);
        let info = formula.binaries.get_mut(&Target::LinuxIntel).unwrap();
        info.url.push_str("?raw=true#download");

        let receipt = Installer::new(prefix.path(), archives.path())
            .install(&formula, Target::LinuxIntel)
            .unwrap();
        assert_eq!(fs::read(&receipt.binary_path).unwrap(), SCRIPT);

        let info = formula.binaries.get_mut(&Target::LinuxIntel).unwrap();
        info.url = "https://example.com/".to_string();
        let err = Installer::new(prefix.path(), archives.path())
            .install(&formula, Target::LinuxIntel)
            .unwrap_err();
        assert!(err.to_string().contains("has no file name"));
    }

    #[test]
    fn test_archive_without_binary() {
        let archives = TempDir::new().unwrap();
        let prefix = TempDir::new().unwrap();
        let archive = write_archive(archives.path(), "a.tar.gz", "README.md", b"hello");
        let formula = formula_for(&archive, Target::MacosIntel);

        let err = Installer::new(prefix.path(), archives.path())
            .install(&formula, Target::MacosIntel)
            .unwrap_err();
        assert!(err.to_string().contains("does not contain `ranked-searcher`"));
    }

    #[cfg(unix)]
    #[test]
    fn test_smoke_test_reports_exit_status() {
        let receipt = InstallReceipt {
            version: "0.0.2".to_string(),
            target: Target::LinuxIntel,
            binary_path: PathBuf::from("/bin/sh"),
            sha256: "0".repeat(64),
        };
        let args = ["-c".to_string(), "echo broken >&2; exit 3".to_string()];
        match smoke_test(&receipt, &args).unwrap_err() {
            Error::SmokeTest { status, stderr, .. } => {
                assert_eq!(status, Some(3));
                assert!(stderr.contains("broken"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let args = ["-c".to_string(), "exit 0".to_string()];
        assert!(smoke_test(&receipt, &args).is_ok());
    }

    #[test]
    fn test_smoke_test_missing_binary() {
        let receipt = InstallReceipt {
            version: "0.0.2".to_string(),
            target: Target::LinuxIntel,
            binary_path: PathBuf::from("/nonexistent/ranked-searcher"),
            sha256: "0".repeat(64),
        };
        assert!(matches!(
            smoke_test(&receipt, &[]),
            Err(Error::SmokeTest { status: None, .. })
        ));
    }
}
