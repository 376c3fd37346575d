//! Typed failure taxonomy for sandboxed operations.
//!
//! Operations return these errors internally; the dispatcher flattens them to
//! `Error: <message>` text before anything reaches the model.

use std::time::Duration;

use thiserror::Error;

/// A resolved path escaped the working root.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("path \"{path}\" is outside the working root")]
pub struct ContainmentError {
    /// The caller-supplied path, verbatim.
    pub path: String,
}

/// Failure of a single sandboxed operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    #[error("Cannot {verb} \"{path}\" as it is outside the permitted working directory")]
    Containment { verb: &'static str, path: String },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Execution of \"{path}\" timed out after {} seconds", .limit.as_secs())]
    Timeout { path: String, limit: Duration },

    #[error("executing operation: {0}")]
    Execution(String),

    #[error("Unknown function: {0}")]
    UnknownOperation(String),
}

impl OperationError {
    /// Attach the operation verb to a path guard rejection.
    pub fn containment(verb: &'static str, err: ContainmentError) -> Self {
        OperationError::Containment {
            verb,
            path: err.path,
        }
    }

    /// Stable category label for logs.
    pub fn category(&self) -> &'static str {
        match self {
            OperationError::Containment { .. } => "containment",
            OperationError::NotFound(_) => "not_found",
            OperationError::Validation(_) => "validation",
            OperationError::Timeout { .. } => "timeout",
            OperationError::Execution(_) => "execution",
            OperationError::UnknownOperation(_) => "unknown_operation",
        }
    }

    /// Model-facing text for this failure.
    pub fn to_text(&self) -> String {
        format!("Error: {self}")
    }
}
