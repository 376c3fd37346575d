//! Sandboxed tool-dispatch agent runtime.
//!
//! A conversational loop with a remote language model that may request a
//! small set of local operations (list directory, read file, write file, run
//! script). The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (path normalization, the
//!   operation table, error taxonomy, turn budget, conversation record).
//! - **[`io`]**: Side-effecting adapters (working-root resolution, process
//!   execution, config, the model-service client).
//! - **[`ops`]**: The four sandboxed operations.
//!
//! [`dispatch`] turns untrusted requests into operation results and
//! [`turn`] drives one user turn to completion.

pub mod core;
pub mod dispatch;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod ops;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod turn;
