//! Whole-file write.

use std::fs;

use crate::core::error::OperationError;
use crate::core::operation::OperationKind;
use crate::io::sandbox::Sandbox;

/// Overwrite `file_path` with `content`, creating parent directories inside the root.
pub fn write_file(
    sandbox: &Sandbox,
    file_path: &str,
    content: &str,
) -> Result<String, OperationError> {
    let target = sandbox
        .root
        .resolve(file_path)
        .map_err(|err| OperationError::containment(OperationKind::WriteFile.verb(), err))?;

    if target.is_dir() {
        return Err(OperationError::Validation(format!(
            "\"{file_path}\" is a directory"
        )));
    }
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|err| {
            OperationError::Execution(format!(
                "creating parent directories for \"{file_path}\": {err}"
            ))
        })?;
    }
    fs::write(&target, content.as_bytes())
        .map_err(|err| OperationError::Execution(format!("writing \"{file_path}\": {err}")))?;

    Ok(format!(
        "Successfully wrote to \"{file_path}\" ({} bytes written)",
        content.len()
    ))
}
