#![forbid(unsafe_code)]
//! extest - exercise test dispatcher
//!
//! Runs the tests of a course repository one exercise at a time. Exercises are discovered
//! from test files named `test_ex<N>_<slug>.<ext>`; `extest 3` runs `tests/test_ex3_*`
//! through the configured test tool (pytest by default) and exits with that tool's status.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module
//!   enforces `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod config;
pub mod error;
pub mod exercise;
pub mod selector;
pub mod version;

pub use config::{Config, ConfigLoader, RunnerConfig};
pub use error::{DispatchError, DispatchResult};
pub use exercise::{Exercise, ExerciseId, ExerciseRegistry};
pub use selector::TestSelector;
