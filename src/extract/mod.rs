//! Turns one raw model reply into an assistant turn with canonical tool calls.
//!
//! Backends with native function calling hand over structured calls, which
//! are trusted as-is. For text-only backends the reply is sanitized, repaired
//! and parsed; anything that does not come out as a list of tool calls is
//! kept as ordinary assistant text instead.

mod repair;
mod sanitize;

use repair::repair_json;
use sanitize::sanitize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::MalformedToolCall;
use crate::message::{Message, ToolCall};

/// One reply from the model, before tool-call extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    /// Reply from a backend with native function calling.
    Structured { text: String, calls: Vec<ToolCall> },
    /// Free text that may encode tool calls as JSON.
    Text(String),
}

/// Assistant text plus the tool calls it requests.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssistantTurn {
    pub text: String,
    pub calls: Vec<ToolCall>,
}

impl AssistantTurn {
    pub fn into_message(self) -> Message {
        Message::assistant_with_calls(self.text, self.calls)
    }
}

/// Extracts tool calls from `reply`. Never fails.
pub fn extract(reply: ModelReply) -> AssistantTurn {
    match reply {
        ModelReply::Structured { text, mut calls } => {
            assign_ids(&mut calls);
            AssistantTurn { text, calls }
        }
        ModelReply::Text(raw) => from_text(&raw),
    }
}

/// Textual fallback path: sanitize, repair, parse, or keep as plain text.
///
/// Prose ahead of the calls becomes the turn's text.
pub fn from_text(raw: &str) -> AssistantTurn {
    let text = sanitize(raw);
    if text.trim().is_empty() {
        return AssistantTurn::default();
    }

    match parse_tool_calls(&text) {
        Ok(calls) => {
            debug!(count = calls.len(), "extracted tool calls from text");
            AssistantTurn {
                text: String::new(),
                calls,
            }
        }
        Err(MalformedToolCall::NotJson) => match calls_after_prose(&text) {
            Some((prose, calls)) => {
                debug!(count = calls.len(), "extracted tool calls after leading prose");
                AssistantTurn { text: prose, calls }
            }
            None => AssistantTurn {
                text,
                calls: Vec::new(),
            },
        },
        Err(err) => {
            warn!("treating reply as plain text: {err}");
            AssistantTurn {
                text,
                calls: Vec::new(),
            }
        }
    }
}

/// Finds the first call list that follows leading prose, starting at a code
/// fence or a bracket, and returns the prose before it with the calls.
///
/// Every candidate must still parse as tool calls, so braces inside ordinary
/// prose never turn into a call.
fn calls_after_prose(text: &str) -> Option<(String, Vec<ToolCall>)> {
    text.char_indices()
        .filter(|&(i, c)| matches!(c, '[' | '{') || text[i..].starts_with("```"))
        .find_map(|(i, _)| {
            let calls = parse_tool_calls(&text[i..]).ok()?;
            Some((text[..i].trim_end().to_string(), calls))
        })
}

/// Parses repaired text into tool calls.
///
/// Accepts an array of calls or a single call object. Each call is either
/// `{"id", "type": "function", "function": {"name", "arguments"}}` or the
/// flat `{"id", "name", "arguments"}`.
///
/// # Errors
///
/// Any [`MalformedToolCall`]; a single bad element rejects the whole reply.
pub fn parse_tool_calls(text: &str) -> Result<Vec<ToolCall>, MalformedToolCall> {
    let repaired = repair_json(text)?;
    let value: Value = serde_json::from_str(&repaired)
        .map_err(|e| MalformedToolCall::Unrepairable(e.to_string()))?;

    let items = match value {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        other => return Err(MalformedToolCall::WrongShape(json_type(&other))),
    };
    if items.is_empty() {
        return Err(MalformedToolCall::Empty);
    }

    let mut calls = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| call_from_value(index, item))
        .collect::<Result<Vec<_>, _>>()?;
    assign_ids(&mut calls);
    Ok(calls)
}

fn call_from_value(index: usize, item: Value) -> Result<ToolCall, MalformedToolCall> {
    let mut item = match item {
        Value::Object(map) => map,
        other => return Err(MalformedToolCall::WrongShape(json_type(&other))),
    };

    let id = match item.remove("id") {
        Some(Value::String(id)) => id.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };

    let mut body = match item.remove("function") {
        Some(Value::Object(function)) => function,
        Some(_) => return Err(MalformedToolCall::MissingField { index, field: "function" }),
        None => item,
    };

    let name = match body.remove("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name.trim().to_string(),
        _ => return Err(MalformedToolCall::MissingField { index, field: "name" }),
    };

    let arguments = match body.remove("arguments") {
        Some(raw) => normalize_arguments(index, raw)?,
        None => return Err(MalformedToolCall::MissingField { index, field: "arguments" }),
    };

    Ok(ToolCall {
        id,
        name,
        arguments,
    })
}

/// Arguments must end up as an object. A JSON-encoded string is repaired
/// and parsed; `null` or an empty string means no arguments.
fn normalize_arguments(index: usize, raw: Value) -> Result<Value, MalformedToolCall> {
    match raw {
        Value::Object(_) => Ok(raw),
        Value::Null => Ok(Value::Object(Map::new())),
        Value::String(s) if s.trim().is_empty() => Ok(Value::Object(Map::new())),
        Value::String(s) => {
            let bad = |reason: String| MalformedToolCall::BadArguments { index, reason };
            let repaired = repair_json(&sanitize(&s)).map_err(|e| bad(e.to_string()))?;
            let parsed: Value = serde_json::from_str(&repaired).map_err(|e| bad(e.to_string()))?;
            if parsed.is_object() {
                Ok(parsed)
            } else {
                Err(bad(format!("expected an object, found {}", json_type(&parsed))))
            }
        }
        other => Err(MalformedToolCall::BadArguments {
            index,
            reason: format!("expected an object, found {}", json_type(&other)),
        }),
    }
}

/// Fills in missing ids and makes every id unique within the turn.
///
/// Synthesized ids are derived from position, name and arguments, so the
/// same reply always yields the same ids.
fn assign_ids(calls: &mut [ToolCall]) {
    let mut seen = HashSet::new();
    for (index, call) in calls.iter_mut().enumerate() {
        if call.id.is_empty() {
            call.id = synthesize_id(index, &call.name, &call.arguments);
        }
        while !seen.insert(call.id.clone()) {
            call.id = format!("{}_{index}", call.id);
        }
    }
}

fn synthesize_id(index: usize, name: &str, arguments: &Value) -> String {
    let seed = format!("{index}:{name}:{arguments}");
    let uuid = Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes());
    format!("call_{}", uuid.simple())
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
