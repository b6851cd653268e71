// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

//! ranked-searcher - search inside text files using tf-idf
//!
//! The binary ranks the files of a directory against a query and shows the
//! most relevant ones first, with their matching lines highlighted. It also
//! carries the release tooling that publishes it through Homebrew:
//!
//! - `package` archives a built binary and records its checksum
//! - `formula render|generate` produce the formula for a release
//! - `formula validate|history|shape` check formula records
//! - `install` performs the formula's install and test contract locally
//! - `test` is the self test the formula's `test do` block runs

// CLI output goes to stdout/stderr
#![allow(clippy::print_stdout, clippy::print_stderr)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

/// CLI argument parsing and exit codes.
pub mod cli;
/// Command implementations.
pub mod commands;
/// Logging setup.
pub mod tracing;
