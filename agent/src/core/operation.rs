//! The closed set of sandboxed operations and their argument contracts.
//!
//! Model-supplied requests are untrusted. [`Operation::from_request`] is the
//! only way to turn one into something executable: it resolves the name
//! against [`OperationKind`], validates arguments against the declared JSON
//! Schema, and keeps only the declared parameters.

use jsonschema::validator_for;
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::core::conversation::OperationRequest;
use crate::core::error::OperationError;

/// Operation names the model may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    ListDirectory,
    ReadFile,
    WriteFile,
    RunScript,
}

impl OperationKind {
    pub const ALL: [OperationKind; 4] = [
        OperationKind::ListDirectory,
        OperationKind::ReadFile,
        OperationKind::RunScript,
        OperationKind::WriteFile,
    ];

    /// Wire name used in declarations and model requests.
    pub fn name(self) -> &'static str {
        match self {
            OperationKind::ListDirectory => "get_files_info",
            OperationKind::ReadFile => "get_file_content",
            OperationKind::WriteFile => "write_file",
            OperationKind::RunScript => "run_python_file",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Verb used in containment error messages.
    pub fn verb(self) -> &'static str {
        match self {
            OperationKind::ListDirectory => "list",
            OperationKind::ReadFile => "read",
            OperationKind::WriteFile => "write to",
            OperationKind::RunScript => "execute",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            OperationKind::ListDirectory => {
                "Lists files in the specified directory along with their sizes, constrained to the working directory."
            }
            OperationKind::ReadFile => {
                "Reads the content of a file, constrained to the working directory."
            }
            OperationKind::WriteFile => {
                "Writes content to a specified file, constrained to the working directory. Overwrites the whole file."
            }
            OperationKind::RunScript => {
                "Runs a specified script file with the configured interpreter, constrained to the working directory."
            }
        }
    }

    /// JSON Schema for the operation's arguments.
    pub fn parameters(self) -> Value {
        match self {
            OperationKind::ListDirectory => json!({
                "type": "object",
                "properties": {
                    "directory": {
                        "type": "string",
                        "description": "The directory to list files from, relative to the working directory. If not provided, lists files in the working directory itself."
                    }
                }
            }),
            OperationKind::ReadFile => json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "The path to the file being read, relative to the working directory."
                    }
                },
                "required": ["file_path"]
            }),
            OperationKind::WriteFile => json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "The path to the file being written, relative to the working directory."
                    },
                    "content": {
                        "type": "string",
                        "description": "The content being written to the file."
                    }
                },
                "required": ["file_path", "content"]
            }),
            OperationKind::RunScript => json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "The path to the script being run, relative to the working directory."
                    }
                },
                "required": ["file_path"]
            }),
        }
    }

    pub fn declaration(self) -> OperationDeclaration {
        OperationDeclaration {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// Schema entry sent to the model service for one operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Declarations for every operation, in a stable order.
pub fn declarations() -> Vec<OperationDeclaration> {
    OperationKind::ALL
        .into_iter()
        .map(OperationKind::declaration)
        .collect()
}

/// A validated operation with only its declared arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    ListDirectory { directory: Option<String> },
    ReadFile { file_path: String },
    WriteFile { file_path: String, content: String },
    RunScript { file_path: String },
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::ListDirectory { .. } => OperationKind::ListDirectory,
            Operation::ReadFile { .. } => OperationKind::ReadFile,
            Operation::WriteFile { .. } => OperationKind::WriteFile,
            Operation::RunScript { .. } => OperationKind::RunScript,
        }
    }

    /// Resolve and validate an untrusted request.
    ///
    /// Null-valued arguments are treated as absent. Unknown names yield
    /// [`OperationError::UnknownOperation`].
    pub fn from_request(request: &OperationRequest) -> Result<Self, OperationError> {
        let kind = OperationKind::from_name(&request.name)
            .ok_or_else(|| OperationError::UnknownOperation(request.name.clone()))?;

        let mut args: Map<String, Value> = request
            .arguments
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        validate_arguments(kind, &args)?;

        let op = match kind {
            OperationKind::ListDirectory => Operation::ListDirectory {
                directory: take_string(&mut args, "directory"),
            },
            OperationKind::ReadFile => Operation::ReadFile {
                file_path: require_string(kind, &mut args, "file_path")?,
            },
            OperationKind::WriteFile => Operation::WriteFile {
                file_path: require_string(kind, &mut args, "file_path")?,
                content: require_string(kind, &mut args, "content")?,
            },
            OperationKind::RunScript => Operation::RunScript {
                file_path: require_string(kind, &mut args, "file_path")?,
            },
        };
        Ok(op)
    }
}

fn validate_arguments(
    kind: OperationKind,
    args: &Map<String, Value>,
) -> Result<(), OperationError> {
    let schema = kind.parameters();
    let validator = validator_for(&schema).map_err(|err| {
        OperationError::Execution(format!("invalid schema for {}: {err}", kind.name()))
    })?;
    let instance = Value::Object(args.clone());
    let messages: Vec<String> = validator
        .iter_errors(&instance)
        .map(|err| err.to_string())
        .collect();
    if messages.is_empty() {
        return Ok(());
    }
    Err(OperationError::Validation(format!(
        "Invalid arguments for {}: {}",
        kind.name(),
        messages.join("; ")
    )))
}

fn take_string(args: &mut Map<String, Value>, key: &str) -> Option<String> {
    match args.remove(key) {
        Some(Value::String(value)) => Some(value),
        _ => None,
    }
}

fn require_string(
    kind: OperationKind,
    args: &mut Map<String, Value>,
    key: &str,
) -> Result<String, OperationError> {
    take_string(args, key).ok_or_else(|| {
        OperationError::Validation(format!(
            "Missing required argument \"{key}\" for {}",
            kind.name()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, args: Value) -> OperationRequest {
        let arguments = match args {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        OperationRequest::new(name, arguments)
    }

    #[test]
    fn names_round_trip_through_table() {
        for kind in OperationKind::ALL {
            assert_eq!(OperationKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(OperationKind::from_name("delete_everything"), None);
    }

    #[test]
    fn list_directory_defaults_when_missing_or_null() {
        let op = Operation::from_request(&request("get_files_info", json!({}))).expect("op");
        assert_eq!(op, Operation::ListDirectory { directory: None });

        let op = Operation::from_request(&request("get_files_info", json!({"directory": null})))
            .expect("op");
        assert_eq!(op, Operation::ListDirectory { directory: None });
    }

    #[test]
    fn unexpected_arguments_are_dropped() {
        let op = Operation::from_request(&request(
            "get_file_content",
            json!({"file_path": "main.py", "mode": "rw"}),
        ))
        .expect("op");
        assert_eq!(
            op,
            Operation::ReadFile {
                file_path: "main.py".to_string()
            }
        );
    }

    #[test]
    fn missing_required_argument_is_validation_error() {
        let err = Operation::from_request(&request("write_file", json!({"file_path": "a.txt"})))
            .unwrap_err();
        assert_eq!(err.category(), "validation");
        assert!(err.to_string().contains("content"), "{err}");
    }

    #[test]
    fn wrong_argument_type_is_validation_error() {
        let err = Operation::from_request(&request("run_python_file", json!({"file_path": 7})))
            .unwrap_err();
        assert_eq!(err.category(), "validation");
        assert!(err.to_string().contains("run_python_file"), "{err}");
    }

    #[test]
    fn unknown_name_is_reported() {
        let err = Operation::from_request(&request("rm_rf", json!({}))).unwrap_err();
        assert_eq!(err, OperationError::UnknownOperation("rm_rf".to_string()));
        assert_eq!(err.to_text(), "Error: Unknown function: rm_rf");
    }

    #[test]
    fn declarations_cover_every_operation() {
        let names: Vec<String> = declarations().into_iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec![
                "get_files_info",
                "get_file_content",
                "run_python_file",
                "write_file"
            ]
        );
    }
}
