// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

//! Release management for ranked-searcher.
//!
//! This crate covers everything that happens to a built binary between
//! `cargo build --release` and a Homebrew formula that points at it.
//!
//! # Architecture
//!
//! - [`artifact`] - Targets, tarball packaging, SHA256 checksums and manifests
//! - [`version`] - Semantic version parsing and ordering
//! - [`history`] - Checks that released versions only move forward
//! - [`config`] - `release.toml` configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use ranked_searcher_release::{Artifact, ArtifactBuilder, Target};
//!
//! let builder = ArtifactBuilder::new("dist", "0.0.2", "ranked-searcher");
//! let packaged = builder.package(&Artifact {
//!     target: Target::LinuxIntel,
//!     binary_path: "target/release/ranked-searcher".into(),
//!     name: "ranked-searcher".to_string(),
//! })?;
//! println!("{}  {}", packaged.sha256, packaged.archive_name);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod artifact;
pub mod config;
pub mod error;
pub mod history;
pub mod version;

pub use artifact::{
    Artifact, ArtifactBuilder, ChecksumsManifest, PackagedArtifact, Target, archive_name,
    compute_sha256, is_valid_sha256, verify_sha256,
};
pub use config::{FormulaConfig, ProjectConfig, ReleaseConfig, ReleaseSettings, class_name_for};
pub use error::{Error, Result};
pub use history::{ReleaseEntry, ReleaseHistory};
pub use version::Version;
