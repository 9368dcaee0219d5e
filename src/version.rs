//! extest version information.
//!
//! Exposed as a single constant so the CLI banner and `--version` agree on the same value.
//!
//! ## Notes
//!
//! - The value is taken from Cargo metadata (`CARGO_PKG_VERSION`) at compile time.

/// The extest version string (for example, `0.1.0`).
pub const EXTEST_VERSION: &str = env!("CARGO_PKG_VERSION");
