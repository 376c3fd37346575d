//! Side-effecting adapters: sandbox root, processes, config, model service.

pub mod config;
pub mod gemini;
pub mod model;
pub mod process;
pub mod prompt;
pub mod sandbox;
