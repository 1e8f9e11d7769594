//! The closed set of file tools and the dispatcher that runs them.
//!
//! Tool names map onto [`ToolKind`]; arguments are validated into a typed
//! [`ToolInvocation`] before anything touches the file system. Every call
//! produces exactly one [`ToolResult`], errors included.

pub mod edit_file;
pub mod list_files;
pub mod path;
pub mod read_file;
pub mod write_encoded;

use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::ToolError;
use crate::message::{Message, ToolCall};

use edit_file::EditFileArgs;
use list_files::ListFilesArgs;
use read_file::ReadFileArgs;
use write_encoded::EncodedArgs;

/// Definition sent to the LLM so it knows what tools are available.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value, // JSON Schema
}

/// Every tool scrivener knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    ReadFile,
    ListFiles,
    EditFile,
    WriteEncoded,
    AppendEncoded,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        ToolKind::ReadFile,
        ToolKind::ListFiles,
        ToolKind::EditFile,
        ToolKind::WriteEncoded,
        ToolKind::AppendEncoded,
    ];

    /// Unique name the LLM uses to call this tool.
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::ReadFile => read_file::NAME,
            ToolKind::ListFiles => list_files::NAME,
            ToolKind::EditFile => edit_file::NAME,
            ToolKind::WriteEncoded => write_encoded::WRITE_NAME,
            ToolKind::AppendEncoded => write_encoded::APPEND_NAME,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            ToolKind::ReadFile => read_file::DESCRIPTION,
            ToolKind::ListFiles => list_files::DESCRIPTION,
            ToolKind::EditFile => edit_file::DESCRIPTION,
            ToolKind::WriteEncoded => write_encoded::WRITE_DESCRIPTION,
            ToolKind::AppendEncoded => write_encoded::APPEND_DESCRIPTION,
        }
    }

    /// JSON Schema describing the tool's input parameters.
    pub fn schema(self) -> Value {
        match self {
            ToolKind::ReadFile => read_file::schema(),
            ToolKind::ListFiles => list_files::schema(),
            ToolKind::EditFile => edit_file::schema(),
            ToolKind::WriteEncoded | ToolKind::AppendEncoded => write_encoded::schema(),
        }
    }

    pub fn definition(self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.schema(),
        }
    }
}

/// A tool call whose arguments have been validated.
#[derive(Debug)]
pub enum ToolInvocation {
    ReadFile(ReadFileArgs),
    ListFiles(ListFilesArgs),
    EditFile(EditFileArgs),
    WriteEncoded(EncodedArgs),
    AppendEncoded(EncodedArgs),
}

impl ToolInvocation {
    /// Resolves `name` against the registry and validates `arguments`.
    ///
    /// # Errors
    ///
    /// [`ToolError::ToolNotRegistered`] for unknown names and
    /// [`ToolError::InvalidArguments`] for missing or mistyped fields.
    pub fn parse(name: &str, arguments: &Value) -> Result<Self, ToolError> {
        let kind =
            ToolKind::from_name(name).ok_or_else(|| ToolError::ToolNotRegistered(name.into()))?;
        Ok(match kind {
            ToolKind::ReadFile => Self::ReadFile(parse_args(kind, arguments)?),
            ToolKind::ListFiles => Self::ListFiles(parse_args(kind, arguments)?),
            ToolKind::EditFile => Self::EditFile(parse_args(kind, arguments)?),
            ToolKind::WriteEncoded => Self::WriteEncoded(parse_args(kind, arguments)?),
            ToolKind::AppendEncoded => Self::AppendEncoded(parse_args(kind, arguments)?),
        })
    }

    fn execute(&self, working_dir: &Path) -> Result<Value, ToolError> {
        match self {
            Self::ReadFile(args) => read_file::execute(working_dir, args),
            Self::ListFiles(args) => list_files::execute(working_dir, args),
            Self::EditFile(args) => edit_file::execute(working_dir, args),
            Self::WriteEncoded(args) => write_encoded::write(working_dir, args),
            Self::AppendEncoded(args) => write_encoded::append(working_dir, args),
        }
    }
}

fn parse_args<T: DeserializeOwned>(kind: ToolKind, arguments: &Value) -> Result<T, ToolError> {
    let invalid = |reason: String| ToolError::InvalidArguments {
        tool: kind.name().to_string(),
        reason,
    };
    if !arguments.is_object() {
        return Err(invalid(format!("expected an object, got {arguments}")));
    }
    serde_json::from_value(arguments.clone()).map_err(|e| invalid(e.to_string()))
}

/// The result of executing one tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    /// Id of the [`ToolCall`] this result answers.
    pub call_id: String,
    /// Outcome payload, or `{"error": kind, "message": ...}` on failure.
    pub payload: Value,
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(call_id: impl Into<String>, payload: Value) -> Self {
        Self {
            call_id: call_id.into(),
            payload,
            is_error: false,
        }
    }

    pub fn error(call_id: impl Into<String>, err: &ToolError) -> Self {
        Self {
            call_id: call_id.into(),
            payload: err.to_payload(),
            is_error: true,
        }
    }

    /// Tool-role message that feeds this result back to the LLM.
    pub fn to_message(&self) -> Message {
        Message::tool_result(self.call_id.clone(), self.payload.to_string())
    }
}

/// Dispatches tool calls against a fixed working directory.
pub struct ToolRegistry {
    /// Relative paths are resolved against this directory.
    working_dir: PathBuf,
}

impl ToolRegistry {
    pub fn new(working_dir: PathBuf) -> Self {
        Self { working_dir }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Produce definitions for the LLM (sent in the API request).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        ToolKind::ALL.into_iter().map(ToolKind::definition).collect()
    }

    /// Validates and runs one call. Never fails: errors become error results.
    pub async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        let outcome = ToolInvocation::parse(&call.name, &call.arguments)
            .and_then(|invocation| invocation.execute(&self.working_dir));
        match outcome {
            Ok(payload) => {
                debug!(tool = %call.name, id = %call.id, "tool call succeeded");
                ToolResult::success(call.id.clone(), payload)
            }
            Err(err) => {
                warn!(tool = %call.name, id = %call.id, kind = err.kind(), "tool call failed: {err}");
                ToolResult::error(call.id.clone(), &err)
            }
        }
    }

    /// Runs sibling calls from one assistant turn.
    ///
    /// Results come back in request order regardless of completion order.
    /// Earlier calls are not rolled back when a later one fails.
    pub async fn dispatch_batch(&self, calls: &[ToolCall]) -> Vec<ToolResult> {
        join_all(calls.iter().map(|call| self.dispatch(call))).await
    }
}

/// Instructions for backends without native function calling.
///
/// Lists every tool with its schema and the JSON shape the reply must take.
pub fn text_protocol_preamble(definitions: &[ToolDefinition]) -> String {
    let catalog: Vec<Value> = definitions
        .iter()
        .map(|d| json!({"name": d.name, "description": d.description, "parameters": d.parameters}))
        .collect();
    let catalog = serde_json::to_string_pretty(&catalog).unwrap_or_default();
    format!(
        "You can use the following tools:\n{catalog}\n\n\
To call tools, reply with ONLY a JSON array and no other text, shaped like:\n\
[{{\"id\": \"call_1\", \"type\": \"function\", \"function\": {{\"name\": \"read_file\", \"arguments\": {{\"path\": \"README.md\"}}}}}}]\n\
File content for write_encoded and append_encoded must be base64-encoded. \
When no tool is needed, reply with plain text."
    )
}

#[cfg(test)]
mod tests;
