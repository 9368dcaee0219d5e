//! Delegated test tool boundary
//!
//! The dispatcher never runs tests itself. It builds an [`Invocation`], hands it to a
//! [`TestExecutor`] and gets back an [`ExecutionReport`]:
//! - [`ProcessExecutor`] spawns the configured tool and waits for it (current behavior)
//! - [`DryRunExecutor`] prints the command line instead of running it
//!
//! Tests plug in their own executor to return controlled exit codes.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::Once;

use crate::config::Config;
use crate::error::{DispatchError, DispatchResult};
use crate::selector::TestSelector;

/// A fully resolved call to the test tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub selector: TestSelector,
    /// Files matched by the selector; `None` when the whole tests directory is passed
    pub matched: Option<usize>,
}

impl Invocation {
    /// Build `<program> [extra_args...] <selector args...> <verbose> <no-coverage>`.
    pub fn build(config: &Config, root: &Path, selector: TestSelector) -> DispatchResult<Self> {
        let expansion = selector.expand(root, &config.tests_dir)?;
        let runner = &config.runner;

        let mut args = runner.extra_args.clone();
        args.extend(expansion.args);
        args.extend(
            [&runner.verbose_flag, &runner.no_coverage_flag]
                .into_iter()
                .filter(|flag| !flag.is_empty())
                .cloned(),
        );

        Ok(Self {
            program: runner.program.clone(),
            args,
            working_dir: root.to_path_buf(),
            selector,
            matched: expansion.matched,
        })
    }

    /// Shell-style rendering for dry runs and logs.
    pub fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|arg| shell_quote(arg))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%*".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// How the test tool ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Exited(i32),
    /// Killed by a signal (number is only known on unix)
    Signaled(Option<i32>),
}

impl From<ExitStatus> for Termination {
    fn from(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Termination::Exited(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            Termination::Signaled(status.signal())
        }
        #[cfg(not(unix))]
        {
            Termination::Signaled(None)
        }
    }
}

/// Raw result of running the test tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub termination: Termination,
    /// Last non-empty line the tool printed on stdout (pytest's session summary)
    pub summary: Option<String>,
}

impl ExecutionReport {
    pub fn exited(code: i32) -> Self {
        Self {
            termination: Termination::Exited(code),
            summary: None,
        }
    }
}

/// Run an invocation and report how it ended.
///
/// Implementations must not interpret the exit code; classification happens in
/// [`DispatchOutcome::classify`](super::dispatch::DispatchOutcome::classify).
pub trait TestExecutor {
    fn execute(&self, invocation: &Invocation) -> DispatchResult<ExecutionReport>;
}

/// Spawns the test tool as a child process (current behavior).
pub struct ProcessExecutor {
    /// Pipe stdout through the dispatcher to remember the summary line
    pub capture_summary: bool,
}

impl ProcessExecutor {
    pub fn new(capture_summary: bool) -> Self {
        Self { capture_summary }
    }
}

impl TestExecutor for ProcessExecutor {
    fn execute(&self, invocation: &Invocation) -> DispatchResult<ExecutionReport> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args).current_dir(&invocation.working_dir);
        if self.capture_summary {
            cmd.stdout(Stdio::piped());
        }

        leave_interrupts_to_child();
        tracing::debug!(command = %invocation.command_line(), dir = %invocation.working_dir.display(), "spawning test tool");
        let mut child = cmd.spawn().map_err(|source| DispatchError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;

        let relayed = match child.stdout.take() {
            Some(stdout) => relay_output(stdout, &mut io::stdout().lock()),
            None => Ok(None),
        };
        // The pipe is closed once relaying stops, so the child cannot block on it here.
        let status = child.wait()?;
        let summary = relayed?;

        Ok(ExecutionReport {
            termination: status.into(),
            summary,
        })
    }
}

/// Ctrl-C reaches the test tool through the foreground process group. extest itself
/// keeps relaying and reports whatever status the tool ends with.
fn leave_interrupts_to_child() {
    static INSTALLED: Once = Once::new();
    INSTALLED.call_once(|| {
        if let Err(err) = ctrlc::set_handler(|| tracing::debug!("interrupt received; waiting for the test tool")) {
            tracing::warn!(error = %err, "failed to install interrupt handler");
        }
    });
}

/// Copy `source` to `sink` line by line and return the last non-empty line.
fn relay_output(source: impl Read, sink: &mut impl Write) -> io::Result<Option<String>> {
    let mut reader = BufReader::new(source);
    let mut line = Vec::new();
    let mut summary = None;
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(summary);
        }
        // Keep draining even if our own stdout went away, or the child blocks.
        let _ = sink.write_all(&line).and_then(|_| sink.flush());
        let text = String::from_utf8_lossy(&line);
        let text = text.trim();
        if !text.is_empty() {
            summary = Some(text.to_string());
        }
    }
}

/// Prints the command that would run and reports success.
pub struct DryRunExecutor;

impl TestExecutor for DryRunExecutor {
    fn execute(&self, invocation: &Invocation) -> DispatchResult<ExecutionReport> {
        let command_line = invocation.command_line();
        println!("{}", command_line);
        Ok(ExecutionReport {
            termination: Termination::Exited(0),
            summary: Some(command_line),
        })
    }
}
