//! Interactive chat REPL for scrivener.
//!
//! Provides a multi-turn conversation loop using [`rustyline`] for readline
//! support (history, line editing). Every line starts one exchange on the
//! same [`Conversation`], so the model keeps the full context.

use anyhow::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::agent::Conversation;
use crate::config::Config;
use crate::format;
use crate::output::StdoutRenderer;
use crate::provider::Provider;

/// Runs the interactive chat REPL.
///
/// # Readline behavior
///
/// - **Ctrl+C** at the prompt: clears the line, stays in the REPL
/// - **Ctrl+C** during an exchange: abandons it; tool calls it left
///   unanswered are closed before the next request
/// - **Ctrl+D** or `/quit`: exits cleanly with "goodbye."
/// - Readline history is persisted to `~/.cache/scrivener/chat_history.txt`
pub async fn run_chat(mut conversation: Conversation<Provider>, verbose: bool) -> Result<()> {
    crate::cli::print_header(&conversation);
    println!("{}", "(Ctrl+D to exit)".dimmed());
    println!();

    let mut rl = DefaultEditor::new()?;
    let history_path = Config::cache_dir()?.join(crate::constants::HISTORY_FILENAME);
    if history_path.exists() {
        let _ = rl.load_history(&history_path);
    }

    loop {
        match rl.readline(&format::user_prompt()) {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);
                if line == "/quit" || line == "/exit" {
                    println!("{}", "goodbye.".dimmed());
                    break;
                }
                println!();

                let mut renderer = StdoutRenderer::new(verbose);
                tokio::select! {
                    outcome = conversation.submit(&line, &mut renderer) => match outcome {
                        Ok(exchange) => println!("{}", format::exchange_footer(&exchange)),
                        Err(e) => eprintln!("{} {}", "error:".red().bold(), e),
                    },
                    _ = tokio::signal::ctrl_c() => {
                        println!("{}", "^C interrupted".dimmed());
                    }
                }
                println!();
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "^C".dimmed());
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "goodbye.".dimmed());
                break;
            }
            Err(e) => {
                eprintln!("{} {}", "error:".red().bold(), e);
                break;
            }
        }
    }

    // Save readline history
    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let _ = rl.save_history(&history_path);

    Ok(())
}
