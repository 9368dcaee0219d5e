//! Errors raised by the dispatcher itself.
//!
//! Failures of the delegated test tool are *not* errors here: they come back as an exit
//! status inside an [`ExecutionReport`](crate::cli::interfaces::ExecutionReport) and are
//! classified, never wrapped.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that occur before or while handing control to the test tool
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid exercise '{token}': {reason}")]
    InvalidExercise { token: String, reason: String },

    #[error("unknown exercise '{token}' (known: {known})")]
    UnknownExercise { token: String, known: String },

    #[error("tests directory not found: {}", .0.display())]
    TestsDirMissing(PathBuf),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatchError {
    /// True for errors caused by the exercise argument rather than the environment.
    pub fn is_usage(&self) -> bool {
        matches!(self, DispatchError::InvalidExercise { .. } | DispatchError::UnknownExercise { .. })
    }
}

impl From<figment::Error> for DispatchError {
    fn from(err: figment::Error) -> Self {
        DispatchError::Config(err.to_string())
    }
}

/// Result type for dispatcher operations.
pub type DispatchResult<T> = Result<T, DispatchError>;
