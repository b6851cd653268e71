//! ranked-searcher CLI application

// CLI binary needs to output to stdout/stderr - this is intentional
#![allow(clippy::print_stdout, clippy::print_stderr)]

use ranked_searcher::cli::{
    self, CliError, Commands, EXIT_OK, FormulaCommands, OkEnvelope, exit_code_for, render_error,
};
use ranked_searcher::commands::{formula, install, package, search, smoke, version};
use ranked_searcher::tracing::{TracingConfig, init_tracing};
use ranked_searcher_release::ReleaseConfig;
use serde::Serialize;
use std::fmt::Display;
use std::io::IsTerminal;
use std::path::Path;

fn main() {
    // NOTE: Using eprintln! in panic hook is intentional - tracing infrastructure
    // may be corrupted during a panic, so we use the most reliable output method.
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();

    let tracing_config = TracingConfig {
        format: cli.log_format,
        level: cli.level.into(),
        ..Default::default()
    };
    // Ignore error if tracing already initialized (e.g., in tests)
    let _ = init_tracing(tracing_config);

    let exit_code = match execute_command(cli.command, cli.json, &cli.config) {
        Ok(()) => EXIT_OK,
        Err(err) => {
            render_error(&err, cli.json);
            exit_code_for(&err)
        }
    };
    std::process::exit(exit_code);
}

/// Prints a command's output as text or as a JSON envelope.
fn emit<T: Serialize + Display>(output: &T, json_mode: bool) -> Result<(), CliError> {
    if json_mode {
        println!("{}", OkEnvelope::new(output).to_json()?);
    } else {
        println!("{output}");
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<ReleaseConfig, CliError> {
    Ok(ReleaseConfig::load_or_default(path)?)
}

fn execute_command(command: Commands, json_mode: bool, config: &Path) -> Result<(), CliError> {
    match command {
        Commands::Search {
            query,
            dir,
            limit,
            stats,
            no_highlight,
            no_color,
        } => {
            let options = search::SearchOptions {
                dir,
                limit,
                stats,
                highlight: !no_highlight,
                color: !no_color && std::io::stdout().is_terminal(),
            };
            let report = search::execute_search(&query, &options)?;
            if json_mode {
                println!("{}", OkEnvelope::new(&report).to_json()?);
            } else {
                print!("{}", search::render_text(&report, &options));
            }
            Ok(())
        }

        Commands::Test => {
            let report = smoke::execute_smoke_test()?;
            if json_mode {
                println!("{}", OkEnvelope::new(&report).to_json()?);
            } else {
                println!("Self test passed: {}", report.ranking.join(", "));
            }
            Ok(())
        }

        Commands::Version => emit(&version::get_version_info(), json_mode),

        Commands::Formula { subcommand } => execute_formula(subcommand, json_mode, config),

        Commands::Package {
            binary,
            target,
            release_version,
            output_dir,
        } => {
            let config = load_config(config)?;
            let output =
                package::execute_package(&config, &binary, target, &release_version, &output_dir)?;
            emit(&output, json_mode)
        }

        Commands::Install {
            formula,
            archive_dir,
            prefix,
            target,
            skip_test,
        } => {
            let output =
                install::execute_install(&formula, &archive_dir, &prefix, target, skip_test)?;
            emit(&output, json_mode)
        }
    }
}

fn execute_formula(
    command: FormulaCommands,
    json_mode: bool,
    config: &Path,
) -> Result<(), CliError> {
    match command {
        FormulaCommands::Render {
            release_version,
            template,
            checksums,
            sha256,
            output,
        } => {
            let config = load_config(config)?;
            let output = formula::execute_render(
                &config,
                &release_version,
                template.as_deref(),
                checksums.as_deref(),
                &sha256,
                output.as_deref(),
            )?;
            emit(&output, json_mode)
        }

        FormulaCommands::Generate {
            release_version,
            checksums,
            output,
        } => {
            let config = load_config(config)?;
            let output = formula::execute_generate(
                &config,
                &release_version,
                &checksums,
                output.as_deref(),
            )?;
            emit(&output, json_mode)
        }

        FormulaCommands::Validate { files } => {
            let output = formula::execute_validate(&files)?;
            formula::require_valid(&output)?;
            emit(&output, json_mode)
        }

        FormulaCommands::History { files } => emit(&formula::execute_history(&files)?, json_mode),

        FormulaCommands::Shape { expected, actual } => {
            emit(&formula::execute_shape(&expected, &actual)?, json_mode)
        }
    }
}
