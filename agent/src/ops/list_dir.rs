//! Directory listing.

use std::fs;

use crate::core::error::OperationError;
use crate::core::operation::OperationKind;
use crate::io::sandbox::Sandbox;

/// List the immediate children of `directory` (default: the working root).
///
/// One line per entry, sorted by name:
/// `- <name>: file_size=<bytes> bytes, is_dir=<bool>`.
pub fn list_directory(
    sandbox: &Sandbox,
    directory: Option<&str>,
) -> Result<String, OperationError> {
    let display = directory.unwrap_or(".");
    let target = sandbox
        .root
        .resolve(directory.unwrap_or(""))
        .map_err(|err| OperationError::containment(OperationKind::ListDirectory.verb(), err))?;

    if !target.exists() {
        return Err(OperationError::NotFound(format!(
            "Directory \"{display}\" not found"
        )));
    }
    if !target.is_dir() {
        return Err(OperationError::Validation(format!(
            "\"{display}\" is not a directory"
        )));
    }

    let read = fs::read_dir(&target)
        .map_err(|err| OperationError::Execution(format!("listing \"{display}\": {err}")))?;
    let mut entries = Vec::new();
    for entry in read {
        let entry = entry
            .map_err(|err| OperationError::Execution(format!("listing \"{display}\": {err}")))?;
        let metadata = entry.metadata().map_err(|err| {
            OperationError::Execution(format!(
                "reading metadata for \"{}\": {err}",
                entry.file_name().to_string_lossy()
            ))
        })?;
        entries.push((
            entry.file_name().to_string_lossy().into_owned(),
            metadata.len(),
            metadata.is_dir(),
        ));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    if entries.is_empty() {
        return Ok(format!("Directory \"{display}\" is empty"));
    }
    let lines: Vec<String> = entries
        .into_iter()
        .map(|(name, size, is_dir)| format!("- {name}: file_size={size} bytes, is_dir={is_dir}"))
        .collect();
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestSandbox;

    #[test]
    fn lists_files_and_dirs_sorted_by_name() {
        let sandbox = TestSandbox::new();
        sandbox.write("b/inner.txt", "x");
        sandbox.write("a", "0123456789");

        let out = list_directory(sandbox.sandbox(), None).expect("list");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "- a: file_size=10 bytes, is_dir=false");
        assert!(lines[1].starts_with("- b: file_size="), "{out}");
        assert!(lines[1].ends_with("is_dir=true"), "{out}");
    }

    #[test]
    fn dot_and_missing_argument_list_root() {
        let sandbox = TestSandbox::new();
        sandbox.write("main.py", "print(1)");
        let default = list_directory(sandbox.sandbox(), None).expect("default");
        assert_eq!(list_directory(sandbox.sandbox(), Some(".")).expect("dot"), default);
        assert_eq!(list_directory(sandbox.sandbox(), Some("./")).expect("slash"), default);
    }

    #[test]
    fn lists_subdirectory() {
        let sandbox = TestSandbox::new();
        sandbox.write("pkg/mod.py", "x = 1\n");
        let out = list_directory(sandbox.sandbox(), Some("pkg")).expect("list");
        assert_eq!(out, "- mod.py: file_size=6 bytes, is_dir=false");
    }

    #[test]
    fn empty_directory_is_reported() {
        let sandbox = TestSandbox::new();
        let out = list_directory(sandbox.sandbox(), None).expect("list");
        assert_eq!(out, "Directory \".\" is empty");
    }

    #[test]
    fn escape_is_containment_error() {
        let sandbox = TestSandbox::new();
        let err = list_directory(sandbox.sandbox(), Some("../")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot list \"../\" as it is outside the permitted working directory"
        );
        let err = list_directory(sandbox.sandbox(), Some("/bin")).unwrap_err();
        assert_eq!(err.category(), "containment");
    }

    #[test]
    fn file_target_is_validation_error() {
        let sandbox = TestSandbox::new();
        sandbox.write("main.py", "");
        let err = list_directory(sandbox.sandbox(), Some("main.py")).unwrap_err();
        assert_eq!(err.to_string(), "\"main.py\" is not a directory");
    }

    #[test]
    fn missing_target_is_not_found() {
        let sandbox = TestSandbox::new();
        let err = list_directory(sandbox.sandbox(), Some("nope")).unwrap_err();
        assert_eq!(err.category(), "not_found");
    }
}
