use colored::Colorize;
use serde_json::Value;

use crate::agent::{Exchange, ExchangeStatus};
use crate::message::ToolCall;
use crate::tools::ToolResult;

/// Longest string argument shown inline before it is elided.
const MAX_INLINE_ARG: usize = 60;

pub fn assistant_label() -> String {
    format!("{}", "scrivener:".cyan().bold())
}

pub fn user_prompt() -> String {
    format!("{} ", "you:".green().bold())
}

/// One line per call: `→ edit_file(path="a.txt", old_str="", ...)`.
pub fn format_tool_call(call: &ToolCall) -> String {
    let args = match &call.arguments {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{k}={}", short_value(v)))
            .collect::<Vec<_>>()
            .join(", "),
        other => short_value(other),
    };
    format!(
        "{} {}({})",
        "→".yellow(),
        call.name.yellow().bold(),
        args.dimmed()
    )
}

/// Summary of a tool result; the full payload when `verbose`.
pub fn format_tool_result(result: &ToolResult, verbose: bool) -> String {
    if result.is_error {
        let message = result.payload["message"].as_str().unwrap_or("tool failed");
        return format!("  {} {}", "✗".red().bold(), message.red());
    }
    if verbose {
        let pretty = serde_json::to_string_pretty(&result.payload).unwrap_or_default();
        return format!("  {} {}", "✓".green(), pretty.dimmed());
    }
    let path = result.payload["path"]
        .as_str()
        .or_else(|| result.payload["file_path"].as_str())
        .unwrap_or("");
    let summary = match result.payload["action"].as_str() {
        Some(action) => format!("{action} {path}"),
        None => path.to_string(),
    };
    format!("  {} {}", "✓".green(), summary.dimmed())
}

/// Dimmed one-liner shown after each exchange.
pub fn exchange_footer(exchange: &Exchange) -> String {
    let plural = |n: usize, word: &str| {
        if n == 1 {
            format!("{n} {word}")
        } else {
            format!("{n} {word}s")
        }
    };
    let mut footer = format!(
        "[{}, {}]",
        plural(exchange.model_turns, "model turn"),
        plural(exchange.tool_calls, "tool call")
    );
    if exchange.status == ExchangeStatus::BudgetExhausted {
        footer.push_str(" [iteration budget exhausted]");
    }
    format!("{}", footer.dimmed())
}

fn short_value(value: &Value) -> String {
    match value {
        Value::String(s) if s.chars().count() > MAX_INLINE_ARG => {
            let head: String = s.chars().take(MAX_INLINE_ARG).collect();
            format!("{:?}…", head)
        }
        Value::String(s) => format!("{s:?}"),
        other => other.to_string(),
    }
}
