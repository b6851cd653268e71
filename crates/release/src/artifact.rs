//! Artifact generation for release binaries.
//!
//! This module handles:
//! - Target platform enumeration
//! - Tarball creation with gzip compression
//! - SHA256 checksum generation and verification
//! - Checksums manifest files (`CHECKSUMS.txt`)

use crate::error::{Error, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Supported build targets for binary distribution.
///
/// The declaration order is the order in which targets appear in a formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Target {
    /// macOS `x86_64`
    MacosIntel,
    /// macOS ARM64 (Apple Silicon)
    MacosArm,
    /// Linux `x86_64`
    LinuxIntel,
}

impl Target {
    /// Returns the Rust target triple for this target.
    #[must_use]
    pub const fn rust_triple(&self) -> &'static str {
        match self {
            Self::MacosIntel => "x86_64-apple-darwin",
            Self::MacosArm => "aarch64-apple-darwin",
            Self::LinuxIntel => "x86_64-unknown-linux-gnu",
        }
    }

    /// Returns the OS string for archive naming.
    #[must_use]
    pub const fn os(&self) -> &'static str {
        match self {
            Self::MacosIntel | Self::MacosArm => "macos",
            Self::LinuxIntel => "linux",
        }
    }

    /// Returns the architecture string for archive naming.
    #[must_use]
    pub const fn arch(&self) -> &'static str {
        match self {
            Self::MacosIntel | Self::LinuxIntel => "x86_64",
            Self::MacosArm => "arm64",
        }
    }

    /// Returns the short identifier (e.g., "macos-intel").
    #[must_use]
    pub const fn short_id(&self) -> &'static str {
        match self {
            Self::MacosIntel => "macos-intel",
            Self::MacosArm => "macos-arm",
            Self::LinuxIntel => "linux-intel",
        }
    }

    /// Returns the template placeholder holding this target's checksum.
    #[must_use]
    pub const fn placeholder(&self) -> &'static str {
        match self {
            Self::MacosIntel => "sha256_macos_intel",
            Self::MacosArm => "sha256_macos_arm",
            Self::LinuxIntel => "sha256_linux_intel",
        }
    }

    /// Returns the formula OS block keyword (`on_macos` or `on_linux`).
    #[must_use]
    pub const fn os_block(&self) -> &'static str {
        match self {
            Self::MacosIntel | Self::MacosArm => "on_macos",
            Self::LinuxIntel => "on_linux",
        }
    }

    /// Returns the formula architecture block keyword (`on_intel` or `on_arm`).
    #[must_use]
    pub const fn arch_block(&self) -> &'static str {
        match self {
            Self::MacosIntel | Self::LinuxIntel => "on_intel",
            Self::MacosArm => "on_arm",
        }
    }

    /// Resolves a target from a pair of formula block keywords.
    #[must_use]
    pub fn from_blocks(os_block: &str, arch_block: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|t| t.os_block() == os_block && t.arch_block() == arch_block)
    }

    /// Returns all supported targets.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::MacosIntel, Self::MacosArm, Self::LinuxIntel]
    }

    /// Parses a target from a Rust triple.
    #[must_use]
    pub fn from_rust_triple(triple: &str) -> Option<Self> {
        match triple {
            "x86_64-apple-darwin" => Some(Self::MacosIntel),
            "aarch64-apple-darwin" => Some(Self::MacosArm),
            "x86_64-unknown-linux-gnu" | "x86_64-unknown-linux-musl" => Some(Self::LinuxIntel),
            _ => None,
        }
    }

    /// Returns the target of the running host, if it is a supported one.
    #[must_use]
    pub const fn current() -> Option<Self> {
        if cfg!(all(target_os = "macos", target_arch = "x86_64")) {
            Some(Self::MacosIntel)
        } else if cfg!(all(target_os = "macos", target_arch = "aarch64")) {
            Some(Self::MacosArm)
        } else if cfg!(all(target_os = "linux", target_arch = "x86_64")) {
            Some(Self::LinuxIntel)
        } else {
            None
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_id())
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "macos-intel" => Ok(Self::MacosIntel),
            "macos-arm" => Ok(Self::MacosArm),
            "linux-intel" => Ok(Self::LinuxIntel),
            other => Self::from_rust_triple(other).ok_or_else(|| {
                Error::artifact(
                    format!(
                        "Unknown target: {s}. Valid targets: macos-intel, macos-arm, linux-intel"
                    ),
                    None,
                )
            }),
        }
    }
}

/// A built binary artifact ready for packaging.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// The target platform this artifact was built for.
    pub target: Target,
    /// Path to the compiled binary.
    pub binary_path: PathBuf,
    /// Name of the binary inside the archive (e.g., "ranked-searcher").
    pub name: String,
}

/// A packaged release artifact (tarball + checksum).
#[derive(Debug, Clone)]
pub struct PackagedArtifact {
    /// The target platform.
    pub target: Target,
    /// Path to the .tar.gz archive.
    pub archive_path: PathBuf,
    /// Path to the .sha256 checksum file.
    pub checksum_path: PathBuf,
    /// Name of the archive file.
    pub archive_name: String,
    /// SHA256 checksum hex string.
    pub sha256: String,
}

/// Builder for creating release artifacts.
pub struct ArtifactBuilder {
    output_dir: PathBuf,
    version: String,
    binary_name: String,
}

impl ArtifactBuilder {
    /// Creates a new artifact builder.
    ///
    /// # Arguments
    /// * `output_dir` - Directory to write archives to
    /// * `version` - Version string (e.g., "0.0.2")
    /// * `binary_name` - Name of the binary (e.g., "ranked-searcher")
    #[must_use]
    pub fn new(
        output_dir: impl Into<PathBuf>,
        version: impl Into<String>,
        binary_name: impl Into<String>,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            version: version.into(),
            binary_name: binary_name.into(),
        }
    }

    /// Generates the archive filename for a target.
    ///
    /// Format: `{binary}-{version}-{os}-{arch}.tar.gz`
    #[must_use]
    pub fn archive_name(&self, target: Target) -> String {
        archive_name(&self.binary_name, &self.version, target)
    }

    /// Packages an artifact into a tarball with checksum.
    ///
    /// Creates:
    /// - `{binary}-{version}-{os}-{arch}.tar.gz`
    /// - `{binary}-{version}-{os}-{arch}.tar.gz.sha256`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Output directory cannot be created
    /// - Tarball creation fails
    /// - Checksum computation fails
    pub fn package(&self, artifact: &Artifact) -> Result<PackagedArtifact> {
        std::fs::create_dir_all(&self.output_dir)?;

        let archive_name = self.archive_name(artifact.target);
        let archive_path = self.output_dir.join(&archive_name);
        let checksum_path = self.output_dir.join(format!("{archive_name}.sha256"));

        self.create_tarball(artifact, &archive_path)?;
        let sha256 = compute_sha256(&archive_path)?;
        self.write_checksum_file(&checksum_path, &sha256, &archive_name)?;

        tracing::info!(
            target = %artifact.target,
            archive = %archive_path.display(),
            sha256 = %sha256,
            "Packaged release artifact"
        );

        Ok(PackagedArtifact {
            target: artifact.target,
            archive_path,
            checksum_path,
            archive_name,
            sha256,
        })
    }

    /// Creates a tarball containing the binary.
    #[allow(clippy::unused_self)]
    fn create_tarball(&self, artifact: &Artifact, output: &Path) -> Result<()> {
        let file = File::create(output).map_err(|e| {
            Error::artifact(
                format!("Failed to create archive: {e}"),
                Some(output.to_path_buf()),
            )
        })?;
        let encoder = GzEncoder::new(file, Compression::default());
        let mut archive = tar::Builder::new(encoder);

        let binary_file = File::open(&artifact.binary_path).map_err(|e| {
            Error::artifact(
                format!("Failed to open binary: {e}"),
                Some(artifact.binary_path.clone()),
            )
        })?;
        let metadata = binary_file.metadata().map_err(|e| {
            Error::artifact(
                format!("Failed to read binary metadata: {e}"),
                Some(artifact.binary_path.clone()),
            )
        })?;

        let mut header = tar::Header::new_gnu();
        header.set_path(&artifact.name)?;
        header.set_size(metadata.len());
        header.set_mode(0o755);
        header.set_cksum();

        archive.append(&header, &binary_file)?;
        archive.into_inner()?.finish()?;

        Ok(())
    }

    /// Writes a checksum file in the standard format.
    #[allow(clippy::unused_self)]
    fn write_checksum_file(&self, path: &Path, sha256: &str, filename: &str) -> Result<()> {
        let content = format!("{sha256}  {filename}\n");
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Archive filename for a binary, version, and target.
///
/// Format: `{binary}-{version}-{os}-{arch}.tar.gz`
#[must_use]
pub fn archive_name(binary_name: &str, version: &str, target: Target) -> String {
    format!(
        "{}-{}-{}-{}.tar.gz",
        binary_name,
        version,
        target.os(),
        target.arch()
    )
}

/// Computes the SHA256 checksum of a file as lowercase hex.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn compute_sha256(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| {
        Error::artifact(
            format!("Failed to open file for checksum: {e}"),
            Some(path.to_path_buf()),
        )
    })?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer).map_err(|e| {
            Error::artifact(
                format!("Failed to read file for checksum: {e}"),
                Some(path.to_path_buf()),
            )
        })?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    let hash = hasher.finalize();
    Ok(format!("{hash:x}"))
}

/// Verifies that a file hashes to the expected checksum.
///
/// # Errors
///
/// Returns [`Error::Checksum`] if `expected` is not a valid SHA256 hex string,
/// and [`Error::ChecksumMismatch`] if the file content hashes to anything else.
pub fn verify_sha256(path: &Path, expected: &str) -> Result<()> {
    if !is_valid_sha256(expected) {
        return Err(Error::checksum(format!(
            "expected checksum `{expected}` is not 64 hexadecimal characters"
        )));
    }

    let actual = compute_sha256(path)?;
    if actual.eq_ignore_ascii_case(expected) {
        tracing::debug!(path = %path.display(), sha256 = %actual, "Checksum verified");
        Ok(())
    } else {
        Err(Error::checksum_mismatch(expected, actual, path))
    }
}

/// Returns true if `s` is exactly 64 ASCII hexadecimal characters.
#[must_use]
pub fn is_valid_sha256(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Checksums manifest containing all artifact checksums.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChecksumsManifest {
    /// Map of filename to SHA256 checksum.
    entries: BTreeMap<String, String>,
}

impl ChecksumsManifest {
    /// Creates a new empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a checksum entry, replacing any previous entry for the file.
    pub fn add(&mut self, filename: impl Into<String>, sha256: impl Into<String>) {
        self.entries.insert(filename.into(), sha256.into());
    }

    /// Returns the checksum recorded for a file.
    #[must_use]
    pub fn get(&self, filename: &str) -> Option<&str> {
        self.entries.get(filename).map(String::as_str)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the manifest has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Creates a manifest from packaged artifacts.
    #[must_use]
    pub fn from_artifacts(artifacts: &[PackagedArtifact]) -> Self {
        let mut manifest = Self::new();
        for artifact in artifacts {
            manifest.add(artifact.archive_name.clone(), artifact.sha256.clone());
        }
        manifest
    }

    /// Merges another manifest into this one; its entries win on conflict.
    pub fn merge(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    /// Parses `sha256sum`-style output.
    ///
    /// Each non-blank line is `{sha256}  {filename}`; a `*` binary-mode marker
    /// before the filename is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Checksum`] for malformed lines or invalid digests.
    pub fn parse(content: &str) -> Result<Self> {
        let mut manifest = Self::new();
        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some((sha256, filename)) = line.split_once(char::is_whitespace) else {
                return Err(Error::checksum(format!(
                    "line {}: expected `<sha256>  <file>`",
                    idx + 1
                )));
            };
            let filename = filename.trim_start();
            let filename = filename.strip_prefix('*').unwrap_or(filename);
            if filename.is_empty() {
                return Err(Error::checksum(format!("line {}: missing file name", idx + 1)));
            }
            if !is_valid_sha256(sha256) {
                return Err(Error::checksum(format!(
                    "line {}: `{sha256}` is not 64 hexadecimal characters",
                    idx + 1
                )));
            }
            manifest.add(filename, sha256.to_ascii_lowercase());
        }
        Ok(manifest)
    }

    /// Reads and parses a manifest file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::artifact(
                format!("Failed to read checksums file: {e}"),
                Some(path.to_path_buf()),
            )
        })?;
        Self::parse(&content)
    }

    /// Returns the checksums in the standard format.
    ///
    /// Format: `{sha256}  {filename}\n` (note: two spaces, matching sha256sum output)
    #[must_use]
    pub fn to_checksums_format(&self) -> String {
        let mut lines: Vec<_> = self
            .entries
            .iter()
            .map(|(filename, sha256)| format!("{sha256}  {filename}"))
            .collect();
        lines.sort();
        lines.join("\n") + "\n"
    }

    /// Writes the manifest to a CHECKSUMS.txt file.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the file fails.
    pub fn write(&self, path: &Path) -> Result<()> {
        let content = self.to_checksums_format();
        std::fs::write(path, content)?;
        Ok(())
    }
}
