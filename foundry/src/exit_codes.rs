//! Stable exit codes for foundry CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Command failed due to invalid config, I/O or other errors.
pub const INVALID: i32 = 1;
/// A session command was rejected at the interface boundary (e.g. empty intent).
pub const REJECTED: i32 = 2;
