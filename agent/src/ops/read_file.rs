//! Bounded file read.

use std::fs::File;
use std::io::Read;

use crate::core::error::OperationError;
use crate::core::operation::OperationKind;
use crate::io::sandbox::Sandbox;

/// Read a file as text, truncated to `read_limit_chars` characters.
///
/// At most `4 * limit + 1` bytes are read, which is always enough to tell
/// whether the file holds more than `limit` characters.
pub fn read_file(sandbox: &Sandbox, file_path: &str) -> Result<String, OperationError> {
    let target = sandbox
        .root
        .resolve(file_path)
        .map_err(|err| OperationError::containment(OperationKind::ReadFile.verb(), err))?;

    if !target.is_file() {
        return Err(OperationError::NotFound(format!(
            "File not found or is not a regular file: \"{file_path}\""
        )));
    }

    let limit = sandbox.limits.read_limit_chars;
    let byte_cap = limit.saturating_mul(4).saturating_add(1);
    let file = File::open(&target)
        .map_err(|err| OperationError::Execution(format!("reading \"{file_path}\": {err}")))?;
    let mut bytes = Vec::new();
    file.take(byte_cap as u64)
        .read_to_end(&mut bytes)
        .map_err(|err| OperationError::Execution(format!("reading \"{file_path}\": {err}")))?;

    let text = String::from_utf8_lossy(&bytes);
    match text.char_indices().nth(limit) {
        Some((cut, _)) => Ok(format!(
            "{}\n[...File \"{file_path}\" truncated at {limit} characters]",
            &text[..cut]
        )),
        None => Ok(text.into_owned()),
    }
}
