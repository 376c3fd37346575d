//! CLI tests for session startup.
//!
//! Spawns the agent binary and verifies it refuses to start without a usable
//! working root, config, or credentials.

use std::fs;
use std::process::Command;

use sandbox_agent::exit_codes;

#[test]
fn missing_api_key_exits_with_invalid_code() {
    let temp = tempfile::tempdir().expect("tempdir");

    let output = Command::new(env!("CARGO_BIN_EXE_sandbox-agent"))
        .current_dir(temp.path())
        .env_remove("GEMINI_API_KEY")
        .arg("hello")
        .output()
        .expect("run sandbox-agent");

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("GEMINI_API_KEY"));
}

#[test]
fn missing_root_exits_with_invalid_code() {
    let temp = tempfile::tempdir().expect("tempdir");

    let status = Command::new(env!("CARGO_BIN_EXE_sandbox-agent"))
        .current_dir(temp.path())
        .env("GEMINI_API_KEY", "test-key")
        .args(["--root", "does-not-exist", "hello"])
        .status()
        .expect("run sandbox-agent");

    assert_eq!(status.code(), Some(exit_codes::INVALID));
}

#[test]
fn invalid_config_exits_with_invalid_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("sandbox-agent.toml"), "max_tool_calls = 0\n").expect("write");

    let output = Command::new(env!("CARGO_BIN_EXE_sandbox-agent"))
        .current_dir(temp.path())
        .env("GEMINI_API_KEY", "test-key")
        .arg("hello")
        .output()
        .expect("run sandbox-agent");

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("max_tool_calls"));
}
