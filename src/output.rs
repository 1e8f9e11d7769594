//! Output rendering abstraction for scrivener.
//!
//! Defines the [`Renderer`] trait that decouples the conversation loop from
//! the display layer. [`StdoutRenderer`] prints each event to the terminal
//! as soon as the loop produces it.

use colored::Colorize;
use std::io::{self, Write};

use crate::format;
use crate::message::ToolCall;
use crate::tools::ToolResult;

/// Receives conversation events as the loop produces them.
pub trait Renderer {
    /// Text of an assistant turn (called only for non-empty text).
    fn assistant_text(&mut self, text: &str);

    /// A tool call is about to run.
    fn tool_call(&mut self, call: &ToolCall);

    /// A tool call finished.
    fn tool_result(&mut self, result: &ToolResult);

    /// Loop-level notices (budget exhausted, cancelled calls).
    fn notice(&mut self, message: &str);
}

/// Renders conversation events directly to stdout.
pub struct StdoutRenderer {
    /// Print tool results in full instead of a one-line summary.
    verbose: bool,
}

impl StdoutRenderer {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Renderer for StdoutRenderer {
    fn assistant_text(&mut self, text: &str) {
        println!("{} {}", format::assistant_label(), text);
        io::stdout().flush().ok();
    }

    fn tool_call(&mut self, call: &ToolCall) {
        println!("{}", format::format_tool_call(call));
        io::stdout().flush().ok();
    }

    fn tool_result(&mut self, result: &ToolResult) {
        println!("{}", format::format_tool_result(result, self.verbose));
        io::stdout().flush().ok();
    }

    fn notice(&mut self, message: &str) {
        eprintln!("{} {}", "note:".yellow().bold(), message);
    }
}
