use crate::tracing::{LogLevel, TracingFormat};
use clap::{Parser, Subcommand};
use miette::{Diagnostic, Report};
use ranked_searcher_release::Target;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// CLI, configuration, or validation error exit code
pub const EXIT_CLI: i32 = 2;
/// Operation failure exit code (checksum mismatch, install, I/O)
pub const EXIT_FAILED: i32 = 3;

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// Bad input, configuration, or a formula that fails validation (exit code 2)
    #[error("{message}")]
    #[diagnostic(code(ranked_searcher::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// An operation that was set up correctly but did not succeed (exit code 3)
    #[error("{message}")]
    #[diagnostic(code(ranked_searcher::cli::failed))]
    Failed {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Other unexpected error (exit code 3)
    #[error("Unexpected error: {message}")]
    #[diagnostic(code(ranked_searcher::cli::other))]
    Other {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new configuration error with help text
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a new failure
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new failure with help text
    #[must_use]
    pub fn failed_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a new other error
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            help: None,
        }
    }
}

fn help_of(err: &dyn Diagnostic) -> Option<String> {
    err.help().map(|h| h.to_string())
}

/// Maps release errors to CLI categories:
/// - bad versions, config, checksums text, and history order -> Config (exit code 2)
/// - checksum mismatches, packaging, and I/O -> Failed (exit code 3)
impl From<ranked_searcher_release::Error> for CliError {
    fn from(err: ranked_searcher_release::Error) -> Self {
        use ranked_searcher_release::Error as E;
        let help = help_of(&err);
        let message = err.to_string();
        match err {
            E::InvalidVersion { .. }
            | E::Config { .. }
            | E::Checksum { .. }
            | E::History { .. }
            | E::TomlParse(_) => Self::Config { message, help },
            E::ChecksumMismatch { .. } | E::Artifact { .. } | E::Io(_) => {
                Self::Failed { message, help }
            }
        }
    }
}

/// Maps formula errors to CLI categories. Parse errors keep their line
/// number in the message.
impl From<ranked_searcher_homebrew::Error> for CliError {
    fn from(err: ranked_searcher_homebrew::Error) -> Self {
        use ranked_searcher_homebrew::Error as E;
        let help = help_of(&err);
        match err {
            E::Release(inner) => inner.into(),
            E::Parse {
                message, src, span, ..
            } => {
                let offset = span.offset().min(src.len());
                let line = src[..offset].matches('\n').count() + 1;
                Self::Config {
                    message: format!("Formula parse error on line {line}: {message}"),
                    help,
                }
            }
            E::Template { .. }
            | E::Validation { .. }
            | E::ShapeMismatch { .. } => Self::Config {
                message: err.to_string(),
                help,
            },
            E::Install { .. } | E::SmokeTest { .. } | E::Io(_) => Self::Failed {
                message: err.to_string(),
                help,
            },
        }
    }
}

/// Maps search errors to CLI categories.
impl From<ranked_searcher_index::Error> for CliError {
    fn from(err: ranked_searcher_index::Error) -> Self {
        use ranked_searcher_index::Error as E;
        let help = help_of(&err);
        let message = err.to_string();
        match err {
            E::EmptyQuery | E::NotADirectory { .. } => Self::Config { message, help },
            E::Io { .. } | E::Regex(_) => Self::Failed { message, help },
        }
    }
}

/// Map CLI error to appropriate exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } => EXIT_CLI,
        CliError::Failed { .. } | CliError::Other { .. } => EXIT_FAILED,
    }
}

/// Render error appropriately based on JSON flag
pub fn render_error(err: &CliError, json_mode: bool) {
    if json_mode {
        let (code, help) = match err {
            CliError::Config { help, .. } => ("config", help),
            CliError::Failed { help, .. } => ("failed", help),
            CliError::Other { help, .. } => ("other", help),
        };
        let error_envelope = ErrorEnvelope::new(serde_json::json!({
            "code": code,
            "message": err.to_string(),
            "help": help,
        }));

        match serde_json::to_string(&error_envelope) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("Error serializing error response"),
        }
    } else {
        // Use miette for human-friendly error display
        let report = Report::new(err.clone());
        eprintln!("{report:?}");
        let _ = io::stderr().flush();
    }
}

/// Success response envelope for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkEnvelope<T> {
    /// Status indicator - always "ok" for success
    pub status: &'static str,
    /// The actual data payload
    pub data: T,
}

impl<T> OkEnvelope<T> {
    /// Create a new success envelope
    #[must_use]
    pub const fn new(data: T) -> Self {
        Self { status: "ok", data }
    }
}

impl<T: Serialize> OkEnvelope<T> {
    /// Serializes the envelope to a single JSON line.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized.
    pub fn to_json(&self) -> Result<String, CliError> {
        serde_json::to_string(self)
            .map_err(|e| CliError::other(format!("JSON serialization failed: {e}")))
    }
}

/// Error response envelope for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope<E> {
    /// Status indicator - always "error" for failures
    pub status: &'static str,
    /// The error details
    pub error: E,
}

impl<E> ErrorEnvelope<E> {
    /// Create a new error envelope
    #[must_use]
    pub const fn new(error: E) -> Self {
        Self {
            status: "error",
            error,
        }
    }
}

/// Search inside text files using tf-idf, and package releases for Homebrew.
#[derive(Parser, Debug)]
#[command(name = "ranked-searcher")]
#[command(
    about = "Search inside text files using tf-idf formula, showing the most relevant search at the top"
)]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Logging verbosity level.
    #[arg(
        short = 'l',
        long,
        global = true,
        env = "RANKED_SEARCHER_LOG",
        help = "Set logging level (RUST_LOG takes precedence)",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    /// Emit JSON envelope instead of text.
    #[arg(long, global = true, help = "Emit JSON envelope instead of text")]
    pub json: bool,

    /// Log output format.
    #[arg(
        long,
        global = true,
        help = "Log output format",
        default_value = "pretty",
        value_enum
    )]
    pub log_format: TracingFormat,

    /// Path to the release configuration.
    #[arg(
        long,
        global = true,
        env = "RANKED_SEARCHER_CONFIG",
        help = "Path to release.toml",
        default_value = "release.toml"
    )]
    pub config: PathBuf,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rank the files of a directory against a query.
    #[command(about = "Rank the files of a directory against a query")]
    Search {
        /// Words to search for.
        #[arg(required = true, num_args = 1.., value_name = "QUERY")]
        query: Vec<String>,
        /// Directory to index.
        #[arg(long, short = 'd', default_value = ".", help = "Directory to index")]
        dir: PathBuf,
        /// Show at most this many results.
        #[arg(
            long,
            short = 'n',
            help = "Show at most this many results",
            value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
        )]
        limit: Option<usize>,
        /// Print per-term statistics for each result.
        #[arg(long, help = "Print per-term statistics for each result")]
        stats: bool,
        /// Do not print matching lines.
        #[arg(long, help = "Do not print matching lines")]
        no_highlight: bool,
        /// Print matching lines without colors.
        #[arg(long, help = "Print matching lines without colors")]
        no_color: bool,
    },
    /// Run the built-in self test.
    #[command(about = "Run the built-in self test")]
    Test,
    /// Show version information.
    #[command(about = "Show version information")]
    Version,
    /// Homebrew formula operations.
    #[command(about = "Homebrew formula operations")]
    Formula {
        /// Formula subcommand to execute.
        #[command(subcommand)]
        subcommand: FormulaCommands,
    },
    /// Package a built binary into a release archive.
    #[command(about = "Package a built binary into a release archive")]
    Package {
        /// Path to the built binary.
        #[arg(long, help = "Path to the built binary")]
        binary: PathBuf,
        /// Target the binary was built for.
        #[arg(long, help = "Target (macos-intel, macos-arm, linux-intel, or a Rust triple)")]
        target: Target,
        /// Release version.
        #[arg(long = "version", help = "Release version")]
        release_version: String,
        /// Directory for archives and CHECKSUMS.txt.
        #[arg(long, default_value = "dist", help = "Directory for archives and CHECKSUMS.txt")]
        output_dir: PathBuf,
    },
    /// Install a formula's binary from local archives.
    #[command(about = "Install a formula's binary from local archives")]
    Install {
        /// Formula file to install.
        #[arg(value_name = "FORMULA")]
        formula: PathBuf,
        /// Directory holding the release archives.
        #[arg(long, help = "Directory holding the release archives")]
        archive_dir: PathBuf,
        /// Installation prefix; the binary goes to `<prefix>/bin`.
        #[arg(long, help = "Installation prefix; the binary goes to <PREFIX>/bin")]
        prefix: PathBuf,
        /// Target to install (defaults to the running platform).
        #[arg(long, help = "Target to install (defaults to the running platform)")]
        target: Option<Target>,
        /// Skip the formula's test command.
        #[arg(long, help = "Skip the formula's test command")]
        skip_test: bool,
    },
}

/// Formula subcommands.
#[derive(Subcommand, Debug)]
pub enum FormulaCommands {
    /// Render a formula template.
    #[command(about = "Render a formula template")]
    Render {
        /// Release version.
        #[arg(long = "version", help = "Release version")]
        release_version: String,
        /// Template file (defaults to release.toml, then the built-in template).
        #[arg(long, help = "Template file (defaults to release.toml, then the built-in template)")]
        template: Option<PathBuf>,
        /// CHECKSUMS.txt to read checksums from.
        #[arg(long, help = "CHECKSUMS.txt to read checksums from")]
        checksums: Option<PathBuf>,
        /// Checksum for one target, overriding CHECKSUMS.txt.
        #[arg(
            long = "sha256",
            value_name = "TARGET=SHA",
            value_parser = parse_checksum_arg,
            help = "Checksum for one target, overriding CHECKSUMS.txt (repeatable)"
        )]
        sha256: Vec<(Target, String)>,
        /// Write the formula here instead of stdout.
        #[arg(long, short = 'o', help = "Write the formula here instead of stdout")]
        output: Option<PathBuf>,
    },
    /// Generate a formula from release.toml and CHECKSUMS.txt.
    #[command(about = "Generate a formula from release.toml and CHECKSUMS.txt")]
    Generate {
        /// Release version.
        #[arg(long = "version", help = "Release version")]
        release_version: String,
        /// CHECKSUMS.txt for the release.
        #[arg(long, help = "CHECKSUMS.txt for the release")]
        checksums: PathBuf,
        /// Output file (defaults to formula.output in release.toml).
        #[arg(long, short = 'o', help = "Output file (defaults to formula.output in release.toml)")]
        output: Option<PathBuf>,
    },
    /// Parse and validate formula files.
    #[command(about = "Parse and validate formula files")]
    Validate {
        /// Formula files.
        #[arg(required = true, num_args = 1.., value_name = "FILE")]
        files: Vec<PathBuf>,
    },
    /// Check that formula versions strictly increase in the given order.
    #[command(about = "Check that formula versions strictly increase in the given order")]
    History {
        /// Formula files, oldest first.
        #[arg(required = true, num_args = 1.., value_name = "FILE")]
        files: Vec<PathBuf>,
    },
    /// Compare the layout of two formulas.
    #[command(about = "Compare the layout of two formulas")]
    Shape {
        /// Formula with the expected layout (usually a template).
        #[arg(value_name = "EXPECTED")]
        expected: PathBuf,
        /// Formula to check.
        #[arg(value_name = "ACTUAL")]
        actual: PathBuf,
    },
}

/// Parses a `TARGET=SHA` argument.
fn parse_checksum_arg(value: &str) -> Result<(Target, String), String> {
    let (target, sha256) = value
        .split_once('=')
        .ok_or_else(|| format!("expected TARGET=SHA, got `{value}`"))?;
    let target = target.parse::<Target>().map_err(|e| e.to_string())?;
    Ok((target, sha256.to_string()))
}

/// Parse command-line arguments into CLI structure
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(EXIT_OK, 0);
        assert_eq!(exit_code_for(&CliError::config("bad")), EXIT_CLI);
        assert_eq!(exit_code_for(&CliError::failed("broken")), EXIT_FAILED);
        assert_eq!(exit_code_for(&CliError::other("odd")), EXIT_FAILED);
    }

    #[test]
    fn test_release_error_mapping() {
        let err: CliError = ranked_searcher_release::Error::invalid_version("x").into();
        assert_eq!(exit_code_for(&err), EXIT_CLI);

        let err: CliError =
            ranked_searcher_release::Error::checksum_mismatch("a", "b", "file.tar.gz").into();
        assert_eq!(exit_code_for(&err), EXIT_FAILED);
        assert!(err.to_string().contains("Checksum mismatch"));
    }

    #[test]
    fn test_homebrew_error_mapping() {
        let err: CliError = ranked_searcher_homebrew::Error::parse(
            "unexpected `end`",
            "class X < Formula\nend\nend\n",
            (22, 3),
        )
        .into();
        assert_eq!(exit_code_for(&err), EXIT_CLI);
        assert!(err.to_string().contains("line 3"));

        let err: CliError = ranked_searcher_homebrew::Error::smoke_test("exit 1", Some(1), "").into();
        assert_eq!(exit_code_for(&err), EXIT_FAILED);

        let err: CliError = ranked_searcher_homebrew::Error::Release(
            ranked_searcher_release::Error::history("out of order"),
        )
        .into();
        assert_eq!(exit_code_for(&err), EXIT_CLI);
    }

    #[test]
    fn test_index_error_mapping() {
        let err: CliError = ranked_searcher_index::Error::EmptyQuery.into();
        assert_eq!(exit_code_for(&err), EXIT_CLI);
        match err {
            CliError::Config { help, .. } => assert!(help.is_some()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_checksum_arg() {
        let sha = "a".repeat(64);
        let (target, value) = parse_checksum_arg(&format!("macos-arm={sha}")).unwrap();
        assert_eq!(target, Target::MacosArm);
        assert_eq!(value, sha);
        assert!(parse_checksum_arg("macos-arm").is_err());
        assert!(parse_checksum_arg("windows=abc").is_err());
    }

    #[test]
    fn test_parse_search_args() {
        let cli = Cli::try_parse_from([
            "ranked-searcher",
            "search",
            "tf",
            "idf",
            "--dir",
            "docs",
            "--limit",
            "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Search {
                query, dir, limit, ..
            } => {
                assert_eq!(query, vec!["tf", "idf"]);
                assert_eq!(dir, PathBuf::from("docs"));
                assert_eq!(limit, Some(3));
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.level, LogLevel::Warn);
        assert_eq!(cli.config, PathBuf::from("release.toml"));
    }

    #[test]
    fn test_search_limit_must_be_positive() {
        let err = Cli::try_parse_from(["ranked-searcher", "search", "tf", "--limit", "0"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        assert!(Cli::try_parse_from(["ranked-searcher", "search", "tf", "-n", "1"]).is_ok());
    }

    #[test]
    fn test_parse_formula_render_args() {
        let sha = "b".repeat(64);
        let checksum = format!("linux-intel={sha}");
        let cli = Cli::try_parse_from([
            "ranked-searcher",
            "formula",
            "render",
            "--version",
            "0.0.3",
            "--sha256",
            checksum.as_str(),
        ])
        .unwrap();
        match cli.command {
            Commands::Formula {
                subcommand:
                    FormulaCommands::Render {
                        release_version,
                        sha256,
                        ..
                    },
            } => {
                assert_eq!(release_version, "0.0.3");
                assert_eq!(sha256, vec![(Target::LinuxIntel, sha)]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
