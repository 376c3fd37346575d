//! System instruction rendering.

use anyhow::{Context, Result};
use minijinja::{Environment, context};

use crate::io::config::AgentConfig;

const SYSTEM_TEMPLATE: &str = include_str!("prompts/system.md");

/// Render the system instruction for the configured limits and interpreter.
pub fn render_system_instruction(cfg: &AgentConfig) -> Result<String> {
    let mut env = Environment::new();
    env.add_template("system", SYSTEM_TEMPLATE)
        .context("load system template")?;
    let template = env.get_template("system").context("get system template")?;
    let rendered = template
        .render(context! {
            interpreter => cfg.interpreter.as_str(),
            script_extension => cfg.script_extension.as_str(),
            script_timeout_secs => cfg.script_timeout_secs,
            read_limit_chars => cfg.read_limit_chars,
            max_tool_calls => cfg.max_tool_calls,
        })
        .context("render system template")?;
    Ok(rendered.trim().to_string())
}
