// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

//! Homebrew formula support for ranked-searcher.
//!
//! This crate turns release checksums into a Homebrew formula and checks
//! formulas once they exist.
//!
//! # Features
//!
//! - Formula generation from release metadata ([`FormulaGenerator`])
//! - `{{placeholder}}` templates rendered per release ([`FormulaTemplate`])
//! - Parsing formulas back into records ([`parse_formula`])
//! - Validation of URLs, checksums, versions, and layout ([`FormulaValidator`])
//! - Local install and smoke test from downloaded archives ([`Installer`])
//!
//! # Example
//!
//! ```rust,ignore
//! use ranked_searcher_homebrew::{FormulaTemplate, TemplateValues};
//! use ranked_searcher_release::Target;
//!
//! let values = TemplateValues::new("0.0.3")
//!     .with_checksum(Target::MacosIntel, intel_sha)
//!     .with_checksum(Target::MacosArm, arm_sha)
//!     .with_checksum(Target::LinuxIntel, linux_sha);
//! let formula = FormulaTemplate::builtin().render(&values)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

mod error;
mod formula;
mod install;
mod parse;
mod template;
mod validate;

pub use error::{Error, Result};
pub use formula::{BinaryInfo, FormulaData, FormulaGenerator, ruby_string};
pub use install::{InstallReceipt, Installer, smoke_test};
pub use parse::parse_formula;
pub use template::{FormulaTemplate, TemplateValues};
pub use validate::{
    FormulaValidator, Issue, Severity, ValidationReport, compare_shape, shape, validate_history,
};
