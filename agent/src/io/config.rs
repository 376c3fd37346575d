//! Agent configuration loaded from a TOML file.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::io::sandbox::OperationLimits;

/// Agent configuration (TOML).
///
/// Missing fields default to the values the agent ships with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AgentConfig {
    /// Model identifier passed to the model service.
    pub model: String,

    /// Base URL of the model service REST API.
    pub api_base_url: String,

    /// Timeout for a single model request in seconds.
    pub request_timeout_secs: u64,

    /// Maximum operations executed automatically within one user turn.
    pub max_tool_calls: u32,

    /// Wall-clock limit for a script run in seconds.
    pub script_timeout_secs: u64,

    /// Truncate file reads beyond this many characters.
    pub read_limit_chars: usize,

    /// Truncate captured script stdout/stderr beyond this many bytes (per stream).
    pub output_limit_bytes: usize,

    /// Interpreter binary used to run scripts.
    pub interpreter: String,

    /// File extension (without the dot) a script must have.
    pub script_extension: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        let limits = OperationLimits::default();
        Self {
            model: "gemini-2.5-flash".to_string(),
            api_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            request_timeout_secs: 120,
            max_tool_calls: 20,
            script_timeout_secs: limits.script_timeout.as_secs(),
            read_limit_chars: limits.read_limit_chars,
            output_limit_bytes: limits.output_limit_bytes,
            interpreter: limits.interpreter,
            script_extension: limits.script_extension,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(anyhow!("model must be non-empty"));
        }
        if self.api_base_url.trim().is_empty() {
            return Err(anyhow!("api_base_url must be non-empty"));
        }
        if self.request_timeout_secs == 0 {
            return Err(anyhow!("request_timeout_secs must be > 0"));
        }
        if self.max_tool_calls == 0 {
            return Err(anyhow!("max_tool_calls must be > 0"));
        }
        if self.script_timeout_secs == 0 {
            return Err(anyhow!("script_timeout_secs must be > 0"));
        }
        if self.read_limit_chars == 0 {
            return Err(anyhow!("read_limit_chars must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        if self.interpreter.trim().is_empty() {
            return Err(anyhow!("interpreter must be non-empty"));
        }
        if self.script_extension.trim().is_empty() || self.script_extension.starts_with('.') {
            return Err(anyhow!(
                "script_extension must be non-empty and must not start with '.'"
            ));
        }
        Ok(())
    }

    /// Operation limits derived from this config.
    pub fn operation_limits(&self) -> OperationLimits {
        OperationLimits {
            read_limit_chars: self.read_limit_chars,
            script_timeout: Duration::from_secs(self.script_timeout_secs),
            output_limit_bytes: self.output_limit_bytes,
            interpreter: self.interpreter.clone(),
            script_extension: self.script_extension.clone(),
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `AgentConfig::default()`.
pub fn load_config(path: &Path) -> Result<AgentConfig> {
    if !path.exists() {
        let cfg = AgentConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: AgentConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
