//! Dispatch of model-issued operation requests.
//!
//! This is the boundary where typed operation failures become text. Nothing
//! an operation does, including panicking, escapes to the turn loop.

use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::{info, instrument, warn};

use crate::core::conversation::OperationRequest;
use crate::core::error::OperationError;
use crate::core::operation::Operation;
use crate::io::sandbox::Sandbox;
use crate::ops;

/// Result of dispatching one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Operation name as the model requested it.
    pub name: String,
    pub result: Result<String, OperationError>,
}

impl DispatchOutcome {
    /// Model-facing text: the output, or `Error: <message>`.
    pub fn text(&self) -> String {
        match &self.result {
            Ok(text) => text.clone(),
            Err(err) => err.to_text(),
        }
    }

    /// False only when the operation name was not recognized.
    pub fn handled(&self) -> bool {
        !matches!(self.result, Err(OperationError::UnknownOperation(_)))
    }

    pub fn is_error(&self) -> bool {
        self.result.is_err()
    }
}

/// Validate and execute one request against the sandbox.
#[instrument(skip_all, fields(operation = %request.name))]
pub fn dispatch(sandbox: &Sandbox, request: &OperationRequest) -> DispatchOutcome {
    info!("calling operation");
    let result = Operation::from_request(request)
        .and_then(|op| catch_panic(|| ops::execute(sandbox, &op)));
    match &result {
        Ok(_) => info!("operation succeeded"),
        Err(err) => warn!(category = err.category(), err = %err, "operation failed"),
    }
    DispatchOutcome {
        name: request.name.clone(),
        result,
    }
}

/// Run `f`, turning a panic into an execution error carrying the panic message.
fn catch_panic<F>(f: F) -> Result<String, OperationError>
where
    F: FnOnce() -> Result<String, OperationError>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "operation panicked".to_string());
            Err(OperationError::Execution(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TestSandbox, op};
    use serde_json::json;

    #[test]
    fn known_operation_is_executed() {
        let sandbox = TestSandbox::new();
        sandbox.write("a.txt", "hello");
        let outcome = dispatch(
            sandbox.sandbox(),
            &op("get_file_content", json!({"file_path": "a.txt"})),
        );
        assert_eq!(outcome.name, "get_file_content");
        assert_eq!(outcome.text(), "hello");
        assert!(outcome.handled());
        assert!(!outcome.is_error());
    }

    #[test]
    fn unknown_operation_is_not_handled_and_touches_nothing() {
        let sandbox = TestSandbox::new();
        let outcome = dispatch(
            sandbox.sandbox(),
            &op("delete_file", json!({"file_path": "a.txt"})),
        );
        assert!(!outcome.handled());
        assert_eq!(outcome.text(), "Error: Unknown function: delete_file");
        assert_eq!(
            std::fs::read_dir(sandbox.root()).expect("read_dir").count(),
            0
        );
    }

    #[test]
    fn operation_errors_are_flattened_to_text() {
        let sandbox = TestSandbox::new();
        let outcome = dispatch(
            sandbox.sandbox(),
            &op("write_file", json!({"file_path": "../x", "content": "y"})),
        );
        assert!(outcome.handled());
        assert!(outcome.is_error());
        assert_eq!(
            outcome.text(),
            "Error: Cannot write to \"../x\" as it is outside the permitted working directory"
        );
    }

    #[test]
    fn invalid_arguments_are_flattened_to_text() {
        let sandbox = TestSandbox::new();
        let outcome = dispatch(sandbox.sandbox(), &op("get_file_content", json!({})));
        assert!(outcome.handled());
        assert!(outcome.text().starts_with("Error: Invalid arguments for get_file_content"));
    }

    #[test]
    fn panicking_operation_becomes_execution_error() {
        let err = catch_panic(|| panic!("disk on fire")).unwrap_err();
        assert_eq!(err, OperationError::Execution("disk on fire".to_string()));
        assert_eq!(err.to_text(), "Error: executing operation: disk on fire");

        let code = 7;
        let err = catch_panic(|| panic!("exit {code}")).unwrap_err();
        assert_eq!(err, OperationError::Execution("exit 7".to_string()));
    }

    #[test]
    fn non_panicking_result_passes_through() {
        assert_eq!(catch_panic(|| Ok("fine".to_string())), Ok("fine".to_string()));
        assert_eq!(
            catch_panic(|| Err(OperationError::NotFound("gone".to_string()))),
            Err(OperationError::NotFound("gone".to_string()))
        );
    }

    #[test]
    fn every_operation_rejects_escapes_uniformly() {
        let sandbox = TestSandbox::new();
        let cases = [
            op("get_files_info", json!({"directory": "/etc"})),
            op("get_file_content", json!({"file_path": "../escape.txt"})),
            op("write_file", json!({"file_path": "/tmp/escape.txt", "content": "x"})),
            op("run_python_file", json!({"file_path": "../../escape.py"})),
        ];
        for request in &cases {
            let text = dispatch(sandbox.sandbox(), request).text();
            assert!(
                text.ends_with("as it is outside the permitted working directory"),
                "{}: {text}",
                request.name
            );
        }
    }
}
