//! Script execution with a wall-clock limit.

use std::path::Path;
use std::process::Command;

use tracing::{debug, warn};

use crate::core::error::OperationError;
use crate::core::operation::OperationKind;
use crate::io::process::{CommandOutput, run_command_with_timeout};
use crate::io::sandbox::Sandbox;

/// Run `file_path` with the configured interpreter, cwd = working root.
///
/// The path is passed as a single argument; no shell is involved.
pub fn run_script(sandbox: &Sandbox, file_path: &str) -> Result<String, OperationError> {
    let target = sandbox
        .root
        .resolve(file_path)
        .map_err(|err| OperationError::containment(OperationKind::RunScript.verb(), err))?;

    if !target.exists() {
        return Err(OperationError::NotFound(format!(
            "File \"{file_path}\" not found"
        )));
    }
    let extension = sandbox.limits.script_extension.as_str();
    if !has_extension(&target, extension) || !target.is_file() {
        return Err(OperationError::Validation(format!(
            "File \"{file_path}\" is not a .{extension} script"
        )));
    }

    let limit = sandbox.limits.script_timeout;
    let mut cmd = Command::new(&sandbox.limits.interpreter);
    cmd.arg(&target).current_dir(sandbox.root.path());
    debug!(interpreter = %sandbox.limits.interpreter, script = %target.display(), "running script");

    let output = run_command_with_timeout(cmd, limit, sandbox.limits.output_limit_bytes)
        .map_err(|err| OperationError::Execution(format!("running script: {err:#}")))?;

    if output.timed_out {
        warn!(script = file_path, limit_secs = limit.as_secs(), "script timed out");
        return Err(OperationError::Timeout {
            path: file_path.to_string(),
            limit,
        });
    }
    Ok(render_output(&output))
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|ext| ext == extension)
}

fn render_output(output: &CommandOutput) -> String {
    let code = output.status.code();
    if output.stdout.is_empty() && output.stderr.is_empty() && code == Some(0) {
        return "No output produced".to_string();
    }

    let stdout = if output.stdout.is_empty() {
        "No STDOUT from script".to_string()
    } else {
        format!(
            "STDOUT: {}{}",
            String::from_utf8_lossy(&output.stdout).trim(),
            output.stdout_truncated_notice()
        )
    };
    let stderr = if output.stderr.is_empty() {
        "No STDERR from script".to_string()
    } else {
        format!(
            "STDERR: {}{}",
            String::from_utf8_lossy(&output.stderr).trim(),
            output.stderr_truncated_notice()
        )
    };

    match code {
        Some(0) => format!("{stdout}\n{stderr}"),
        Some(code) => format!("{stdout}\n{stderr}\nProcess exited with code {code}"),
        None => format!("{stdout}\n{stderr}\nProcess terminated by signal"),
    }
}
