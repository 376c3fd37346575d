//! Interactive session surface for the sandboxed agent.
//!
//! Reads prompts from the console, drives one turn per prompt through the
//! model and the sandboxed operations, and prints the model's answers.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::info;

use sandbox_agent::core::conversation::ConversationState;
use sandbox_agent::exit_codes;
use sandbox_agent::io::config::{AgentConfig, load_config};
use sandbox_agent::io::gemini::{GeminiClient, GeminiSettings};
use sandbox_agent::io::prompt::render_system_instruction;
use sandbox_agent::io::sandbox::{Sandbox, WorkingRoot};
use sandbox_agent::logging;
use sandbox_agent::turn::{TurnEvent, TurnOutcome, TurnStop, run_turn};

const QUIT: &str = "/q";
const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Parser)]
#[command(
    name = "sandbox-agent",
    version,
    about = "Coding agent confined to a single working directory"
)]
struct Cli {
    /// Initial prompt. Without it the session starts by asking for one.
    prompt: Option<String>,

    /// Directory every operation is confined to.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// TOML config file. Missing file means defaults.
    #[arg(long, default_value = "sandbox-agent.toml")]
    config: PathBuf,

    /// Print operation arguments, results, and token usage.
    #[arg(short, long)]
    verbose: bool,
}

struct Session {
    model: GeminiClient,
    sandbox: Sandbox,
    max_tool_calls: u32,
    verbose: bool,
}

fn main() {
    dotenv::dotenv().ok();
    logging::init();
    let cli = Cli::parse();

    let session = match setup(&cli) {
        Ok(session) => session,
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    };
    if let Err(err) = session.run(cli.prompt) {
        eprintln!("Fatal: {:#}", err);
        std::process::exit(exit_codes::MODEL_FAILURE);
    }
    std::process::exit(exit_codes::OK);
}

fn setup(cli: &Cli) -> Result<Session> {
    let cfg: AgentConfig = load_config(&cli.config)?;
    let root = WorkingRoot::new(&cli.root)?;
    let api_key = std::env::var(API_KEY_ENV)
        .map_err(|_| anyhow!("{API_KEY_ENV} is not set (environment or .env file)"))?;

    let model = GeminiClient::new(GeminiSettings {
        api_base_url: cfg.api_base_url.clone(),
        api_key,
        model: cfg.model.clone(),
        system_instruction: render_system_instruction(&cfg)?,
        request_timeout: Duration::from_secs(cfg.request_timeout_secs),
    })?;
    info!(root = %root.path().display(), model = %cfg.model, "session ready");

    Ok(Session {
        model,
        sandbox: Sandbox::new(root, cfg.operation_limits()),
        max_tool_calls: cfg.max_tool_calls,
        verbose: cli.verbose,
    })
}

impl Session {
    fn run(&self, initial: Option<String>) -> Result<()> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut conversation = ConversationState::new();

        let mut prompt = match initial {
            Some(prompt) => {
                println!("Initial prompt: {prompt}");
                prompt
            }
            None => {
                println!("Sandbox agent - interactive mode");
                println!("Type '{QUIT}' to quit");
                match read_prompt(&mut input, "Enter your prompt: ")? {
                    Some(prompt) => prompt,
                    None => return Ok(()),
                }
            }
        };

        loop {
            conversation.push_user(prompt);
            let outcome = run_turn(
                &self.model,
                &mut conversation,
                &self.sandbox,
                self.max_tool_calls,
                |event| self.print_event(event),
            )?;
            self.print_outcome(&outcome);

            println!("\nEnter your next prompt (or '{QUIT}' to quit):");
            prompt = match read_prompt(&mut input, "> ")? {
                Some(prompt) => prompt,
                None => {
                    println!("Goodbye!");
                    return Ok(());
                }
            };
        }
    }

    fn print_event(&self, event: TurnEvent<'_>) {
        match event {
            TurnEvent::OperationStarted { request } => {
                if self.verbose {
                    println!(
                        "Calling function: {}({})",
                        request.name,
                        serde_json::Value::Object(request.arguments.clone())
                    );
                } else {
                    println!(" - Calling function: {}", request.name);
                }
            }
            TurnEvent::OperationFinished { outcome, .. } => {
                if self.verbose {
                    println!("-> {}", outcome.text());
                }
            }
        }
    }

    fn print_outcome(&self, outcome: &TurnOutcome) {
        match &outcome.stop {
            TurnStop::Complete { text } => println!("{text}"),
            TurnStop::BudgetExhausted { max, .. } => {
                println!("\n[Reached {max} tool calls limit. Conversation history preserved.]");
            }
        }
        if self.verbose {
            println!("Tool calls used in last turn: {}", outcome.operations_executed);
            println!("Prompt tokens: {}", outcome.usage.prompt_tokens);
            println!("Response tokens: {}", outcome.usage.response_tokens);
        }
    }
}

/// Read one non-blank prompt line. `None` on end of input or the quit sentinel.
fn read_prompt<R: BufRead>(input: &mut R, label: &str) -> Result<Option<String>> {
    let mut line = String::new();
    loop {
        print!("{label}");
        io::stdout().flush().context("flush stdout")?;
        line.clear();
        let read = input.read_line(&mut line).context("read prompt")?;
        if read > 0 && line.trim().is_empty() {
            continue;
        }
        return Ok(parse_prompt(read, &line));
    }
}

fn parse_prompt(read: usize, line: &str) -> Option<String> {
    let trimmed = line.trim();
    if read == 0 || trimmed == QUIT {
        return None;
    }
    Some(trimmed.to_string())
}
