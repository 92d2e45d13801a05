//! Binary entry point for the scour CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Run every enabled rule over a snapshot
//! scour check snapshot.json
//!
//! # Preview fixes for one rule, then write them back
//! scour fix snapshot.json --rule SC003
//! scour fix snapshot.json --rule SC003 --write
//!
//! # List registered rules with configuration applied
//! scour rules
//!
//! # Print the trees of a snapshot in notation form
//! scour dump snapshot.json
//! ```
//!
//! Every response is JSON on stdout. Errors are JSON too, with the process
//! exit code taken from the error code.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use scour::cli::{load_config, run_check, run_dump, run_fix, run_rules, LoadedSnapshot};
use scour_core::error::ScourError;
use scour_core::output::{emit_response, emit_response_compact, ErrorResponse};

// ============================================================================
// CLI Structure
// ============================================================================

/// Static analysis and automated fixes for host-parsed syntax trees.
///
/// The host parses and binds its sources, then hands scour a snapshot of
/// the trees and symbols. All output is JSON.
#[derive(Parser, Debug)]
#[command(name = "scour", version, about = "Static analysis and fixes over syntax tree snapshots")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Project root holding `.scour/config.toml` (default: search upward).
    #[arg(long, global = true)]
    project: Option<PathBuf>,

    /// Log level for tracing output. `RUST_LOG` takes precedence.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Emit single-line JSON.
    #[arg(long, global = true)]
    compact: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every enabled rule over a snapshot.
    ///
    /// Exits with 1 when any error-severity diagnostic is reported.
    Check {
        /// Snapshot document or directory.
        snapshot: PathBuf,
    },
    /// Fix every diagnostic of one rule.
    Fix {
        /// Snapshot document or directory.
        snapshot: PathBuf,
        /// Rule whose fixes are applied.
        #[arg(long)]
        rule: String,
        /// Write the fixed snapshot back instead of only reporting it.
        #[arg(long)]
        write: bool,
    },
    /// List registered rules.
    Rules,
    /// Print each unit's tree in notation form.
    Dump {
        /// Snapshot document or directory.
        snapshot: PathBuf,
    },
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

// ============================================================================
// Main
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.global.log_level);

    match execute(cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            let response = ErrorResponse::from_error(&err);
            // Errors go to stdout as JSON like every other response.
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();
            ExitCode::from(err.error_code().code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Execute the CLI command and return the process exit code.
fn execute(cli: Cli) -> Result<u8, ScourError> {
    let config = load_config(cli.global.project.as_deref())?;
    let compact = cli.global.compact;

    match cli.command {
        Command::Check { snapshot } => {
            let loaded = LoadedSnapshot::load(&snapshot)?;
            let response = run_check(&config, &loaded)?;
            emit(&response, compact)?;
            Ok(response.summary.exit_code())
        }
        Command::Fix {
            snapshot,
            rule,
            write,
        } => {
            let loaded = LoadedSnapshot::load(&snapshot)?;
            let response = run_fix(&config, &loaded, &rule, write)?;
            emit(&response, compact)?;
            Ok(0)
        }
        Command::Rules => {
            emit(&run_rules(&config)?, compact)?;
            Ok(0)
        }
        Command::Dump { snapshot } => {
            let loaded = LoadedSnapshot::load(&snapshot)?;
            emit(&run_dump(&loaded)?, compact)?;
            Ok(0)
        }
    }
}

fn emit<T: Serialize>(response: &T, compact: bool) -> Result<(), ScourError> {
    let mut stdout = io::stdout();
    let written = if compact {
        emit_response_compact(response, &mut stdout)
    } else {
        emit_response(response, &mut stdout)
    };
    written
        .and_then(|()| stdout.flush())
        .map_err(|e| ScourError::internal(format!("failed to write response: {}", e)))
}
