//! CLI module for extest
//!
//! ## Commands
//!
//! - `extest [EXERCISE]` - Run the tests of one exercise, or all tests when omitted
//! - `extest list` - List the exercises found in the tests directory
//!
//! ## Modules
//!
//! - `commands` - Command implementations
//! - `dispatch` - Selector resolution, delegation and outcome classification
//! - `interfaces` - The boundary to the delegated test tool
//!
//! ## Design
//!
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;
pub mod dispatch;
pub mod interfaces;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use crate::version::EXTEST_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
    /// Rejected command-line input (same code clap uses)
    pub const USAGE: ExitCode = ExitCode(2);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Run exercise tests through the configured test tool
#[derive(Parser, Debug)]
#[command(name = "extest")]
#[command(version = EXTEST_VERSION)]
#[command(about = "Run exercise tests through the configured test tool", long_about = None)]
#[command(
    after_help = "EXAMPLES:\n    extest              Run all exercise tests\n    extest 3            Run tests/test_ex3_*\n    extest guard_clauses\n                        Run the exercise whose test file is test_ex<N>_guard_clauses.py\n    extest list         Show discovered exercises"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Exercise number (e.g. 3 or ex3) or name; runs all tests when omitted
    #[arg(value_name = "EXERCISE")]
    pub exercise: Option<String>,

    /// Course root containing the tests directory
    #[arg(long, value_name = "DIR", default_value = ".", global = true)]
    pub root: PathBuf,

    /// Config file (default: <ROOT>/extest.toml when present)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Print the test command instead of running it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List exercises discovered in the tests directory
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
pub fn execute(cli: Cli) -> CliResult<ExitCode> {
    if let (Some(command), Some(exercise)) = (&cli.command, &cli.exercise) {
        let name = match command {
            Command::List { .. } => "list",
        };
        return Err(CliError::new(
            format!("Error: exercise '{}' cannot be combined with '{}'", exercise, name),
            ExitCode::USAGE,
        ));
    }

    match cli.command {
        Some(Command::List { json }) => commands::list_exercises(&cli.root, cli.config.as_deref(), json),
        None => commands::run_exercise_tests(&cli.root, cli.config.as_deref(), cli.exercise.as_deref(), cli.dry_run),
    }
}

// ============================================================================
// Tests
// ============================================================================
