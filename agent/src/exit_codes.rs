//! Stable exit codes for the agent CLI.

/// Session ended normally.
pub const OK: i32 = 0;
/// Invalid configuration, working root, or missing credentials.
pub const INVALID: i32 = 1;
/// The model service failed; the session cannot continue.
pub const MODEL_FAILURE: i32 = 2;
