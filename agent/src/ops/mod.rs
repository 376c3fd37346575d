//! The four sandboxed operations.
//!
//! Each operation resolves its target through the sandbox's working root
//! before touching the filesystem or process table, and reports every failure
//! as an [`OperationError`]. None of them retry.

use crate::core::error::OperationError;
use crate::core::operation::Operation;
use crate::io::sandbox::Sandbox;

pub mod list_dir;
pub mod read_file;
pub mod run_script;
pub mod write_file;

/// Execute a validated operation.
pub fn execute(sandbox: &Sandbox, op: &Operation) -> Result<String, OperationError> {
    match op {
        Operation::ListDirectory { directory } => {
            list_dir::list_directory(sandbox, directory.as_deref())
        }
        Operation::ReadFile { file_path } => read_file::read_file(sandbox, file_path),
        Operation::WriteFile { file_path, content } => {
            write_file::write_file(sandbox, file_path, content)
        }
        Operation::RunScript { file_path } => run_script::run_script(sandbox, file_path),
    }
}
