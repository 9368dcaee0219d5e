//! Exercise test dispatch
//!
//! One linear pass per invocation: resolve the exercise argument, announce what is about
//! to run, hand the call to the executor, classify what came back. Nothing is kept
//! between runs.

use std::path::Path;

use super::interfaces::{ExecutionReport, Invocation, Termination, TestExecutor};
use crate::config::Config;
use crate::error::{DispatchError, DispatchResult};
use crate::exercise::{ExerciseId, ExerciseRegistry};
use crate::selector::TestSelector;

// ============================================================================
// Outcome
// ============================================================================

/// Classified result of a delegated run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Passed,
    Failed { code: i32 },
    /// The selector matched no file, or the tool reported that it collected nothing
    NoTestsMatched { code: i32 },
    Interrupted { signal: Option<i32> },
}

impl DispatchOutcome {
    pub fn classify(report: &ExecutionReport, invocation: &Invocation, no_tests_exit_codes: &[i32]) -> Self {
        match report.termination {
            Termination::Signaled(signal) => DispatchOutcome::Interrupted { signal },
            Termination::Exited(0) => DispatchOutcome::Passed,
            Termination::Exited(code) => {
                if invocation.matched == Some(0) || no_tests_exit_codes.contains(&code) {
                    DispatchOutcome::NoTestsMatched { code }
                } else {
                    DispatchOutcome::Failed { code }
                }
            }
        }
    }

    /// Exit status handed back to the shell: always the tool's own status.
    pub fn exit_code(&self) -> i32 {
        match self {
            DispatchOutcome::Passed => 0,
            DispatchOutcome::Failed { code } | DispatchOutcome::NoTestsMatched { code } => *code,
            DispatchOutcome::Interrupted { signal: Some(signal) } => 128 + signal,
            DispatchOutcome::Interrupted { signal: None } => 1,
        }
    }
}

// ============================================================================
// Reporter
// ============================================================================

/// Progress reporting around a dispatch.
pub trait DispatchReporter {
    /// Called once the selector is known, before the tool runs
    fn on_dispatch_start(&mut self, selector: &TestSelector);

    /// Called after the tool has finished
    fn on_dispatch_complete(&mut self, _invocation: &Invocation, _report: &ExecutionReport, _outcome: &DispatchOutcome) {}
}

/// Notices on stdout, diagnostics on stderr.
#[derive(Default)]
pub struct ConsoleReporter;

impl DispatchReporter for ConsoleReporter {
    fn on_dispatch_start(&mut self, selector: &TestSelector) {
        println!("{}", selector.notice());
    }

    fn on_dispatch_complete(&mut self, invocation: &Invocation, _report: &ExecutionReport, outcome: &DispatchOutcome) {
        match outcome {
            DispatchOutcome::NoTestsMatched { .. } => {
                match invocation.selector.file_pattern() {
                    Some(pattern) if invocation.matched == Some(0) => eprintln!("No tests matched '{}'", pattern),
                    _ => eprintln!("No tests collected"),
                }
            }
            DispatchOutcome::Interrupted { signal: Some(signal) } => {
                eprintln!("Test run interrupted (signal {})", signal);
            }
            DispatchOutcome::Interrupted { signal: None } => eprintln!("Test run interrupted"),
            DispatchOutcome::Passed | DispatchOutcome::Failed { .. } => {}
        }
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Resolve the optional exercise token into a selector.
pub fn resolve_selector(config: &Config, root: &Path, exercise: Option<&str>) -> DispatchResult<TestSelector> {
    let tests_path = config.tests_path(root);

    let Some(token) = exercise else {
        if !tests_path.is_dir() {
            return Err(DispatchError::TestsDirMissing(tests_path));
        }
        return Ok(TestSelector::All);
    };

    let id = ExerciseId::parse(token)?;
    tracing::debug!(exercise = %id, "parsed exercise argument");
    let registry = ExerciseRegistry::discover(&tests_path, &config.test_extension)?;
    id.resolve(token, &registry, config.strict)
}

/// Run the tests for `exercise` (or all of them) through `executor`.
pub fn dispatch(
    config: &Config,
    root: &Path,
    exercise: Option<&str>,
    executor: &dyn TestExecutor,
    reporter: &mut dyn DispatchReporter,
) -> DispatchResult<DispatchOutcome> {
    let selector = resolve_selector(config, root, exercise)?;
    let invocation = Invocation::build(config, root, selector)?;

    reporter.on_dispatch_start(&invocation.selector);
    let report = executor.execute(&invocation)?;
    let outcome = DispatchOutcome::classify(&report, &invocation, &config.runner.no_tests_exit_codes);

    tracing::info!(
        command = %invocation.command_line(),
        outcome = ?outcome,
        summary = report.summary.as_deref().unwrap_or(""),
        "test run finished"
    );
    reporter.on_dispatch_complete(&invocation, &report, &outcome);
    Ok(outcome)
}

// ============================================================================
// Tests
// ============================================================================
