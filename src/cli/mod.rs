//! Command-line interface definition and dispatch for scrivener.
//!
//! Uses [`clap`] for argument parsing with derive macros. Each subcommand is
//! routed to its handler; with no subcommand scrivener starts a chat.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use crate::agent::Conversation;
use crate::config::Config;
use crate::format;
use crate::message::Transcript;
use crate::output::StdoutRenderer;
use crate::provider::{self, Provider, ToolCallingMode};
use crate::tools::ToolRegistry;

/// Top-level CLI structure for scrivener.
#[derive(Parser)]
#[command(
    name = "scrivener",
    version,
    about = "A terminal assistant that reads and edits files through tool calls"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Show tool payloads in full and enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Flags that pick the backend and shape the loop.
#[derive(Args, Clone, Default)]
pub struct ModelArgs {
    /// Provider to use (anthropic, openai, openrouter, ollama)
    #[arg(long, global = true)]
    pub provider: Option<String>,
    /// Model to use, optionally as provider/model (overrides config)
    #[arg(short, long, global = true)]
    pub model: Option<String>,
    /// Maximum model invocations per exchange
    #[arg(long, global = true)]
    pub max_iterations: Option<usize>,
    /// How tool calls are exchanged with the model
    #[arg(long, value_enum, global = true)]
    pub tool_calling: Option<ToolCallingMode>,
}

/// Available subcommands for the scrivener CLI.
///
/// The `///` doc comments on variants double as `--help` text rendered by clap.
#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat session (default)
    Chat,
    /// Run a single exchange and exit
    Ask {
        /// What to ask
        prompt: Vec<String>,
    },
    /// Print the tool definitions sent to the model as JSON
    Tools,
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the merged config and where the global file lives
    Show,
}

/// Parses command-line arguments into a [`Cli`] struct.
///
/// Delegates to [`clap::Parser::parse`], which exits the process on invalid input.
pub fn parse() -> Cli {
    Cli::parse()
}

/// Dispatches the parsed CLI command to its handler.
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let conversation = build_conversation(&cli.model)?;
            crate::chat::run_chat(conversation, cli.verbose).await
        }
        Commands::Ask { prompt } => {
            let prompt = prompt.join(" ");
            if prompt.trim().is_empty() {
                anyhow::bail!("No prompt provided. Usage: scrivener ask \"your request here\"");
            }

            let mut conversation = build_conversation(&cli.model)?;
            print_header(&conversation);
            println!("{} {}", ">".green().bold(), prompt);
            println!();

            let mut renderer = StdoutRenderer::new(cli.verbose);
            tokio::select! {
                outcome = conversation.submit(&prompt, &mut renderer) => {
                    let exchange = outcome.context("Exchange failed")?;
                    println!();
                    println!("{}", format::exchange_footer(&exchange));
                }
                _ = tokio::signal::ctrl_c() => {
                    println!("{}", "^C interrupted".dimmed());
                }
            }
            Ok(())
        }
        Commands::Tools => {
            let tools = ToolRegistry::new(std::env::current_dir()?);
            println!("{}", serde_json::to_string_pretty(&tools.definitions())?);
            Ok(())
        }
        Commands::Config { action } => {
            let config = Config::load()?;
            match action {
                ConfigAction::Show => {
                    let path = Config::config_path()?;
                    println!("{} {}", "Config path:".bold(), path.display());
                    println!();
                    println!("{}", toml::to_string_pretty(&config)?);
                }
            }
            Ok(())
        }
    }
}

/// Loads config, resolves the model and wires a [`Conversation`] rooted at
/// the current directory.
fn build_conversation(args: &ModelArgs) -> Result<Conversation<Provider>> {
    let config = Config::load()?;
    let selection = provider::resolve_model(
        args.provider.as_deref(),
        args.model.as_deref(),
        args.tool_calling,
        &config,
    )?;
    let backend = Provider::from_config(&config, &selection)?;

    let working_dir = std::env::current_dir().context("Could not determine working directory")?;
    let transcript = match config.system_prompt.as_deref() {
        Some(prompt) if !prompt.trim().is_empty() => Transcript::with_system(prompt),
        _ => Transcript::default(),
    };
    let max_iterations = args
        .max_iterations
        .unwrap_or_else(|| config.max_iterations());

    Ok(Conversation::new(
        backend,
        ToolRegistry::new(working_dir),
        transcript,
        max_iterations,
    ))
}

/// Prints the model, tool-calling mode and working directory in use.
pub fn print_header(conversation: &Conversation<Provider>) {
    let backend = conversation.backend();
    let mode = match backend.tool_calling() {
        ToolCallingMode::Native => "native",
        ToolCallingMode::Text => "text",
    };
    println!(
        "{} [model: {}/{}] [tools: {}] [max turns: {}]",
        crate::constants::APP_NAME.bold().cyan(),
        backend.kind(),
        backend.model().yellow(),
        mode,
        conversation.max_iterations(),
    );
    println!(
        "{}",
        format!("working in {}", conversation.tools().working_dir().display()).dimmed()
    );
    println!();
}
