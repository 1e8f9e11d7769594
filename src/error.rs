//! Error taxonomy for tool dispatch, tool-call repair and model invocation.
//!
//! Tool errors never escape a turn: the dispatcher converts them into
//! structured payloads the model can read. Only [`ModelInvocationError`]
//! ends an exchange early.

use std::io;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use thiserror::Error;

/// Failure of a single tool call, reported back to the model.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("no such file or directory: {}", .0.display())]
    NotFound(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("tool '{0}' is not registered")]
    ToolNotRegistered(String),

    #[error("invalid arguments for '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("iteration budget of {0} model turns exhausted; call was not executed")]
    IterationBudgetExhausted(usize),

    #[error("call was cancelled before it completed: {0}")]
    Cancelled(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ToolError {
    /// Maps an I/O failure on `path` onto the taxonomy.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            io::ErrorKind::NotADirectory => Self::NotADirectory(path.to_path_buf()),
            io::ErrorKind::IsADirectory => Self::NotAFile(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    /// Stable identifier for the error class, used in tool result payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::NotADirectory(_) => "not_a_directory",
            Self::NotAFile(_) => "not_a_file",
            Self::PermissionDenied(_) => "permission_denied",
            Self::EncodingError(_) => "encoding_error",
            Self::ToolNotRegistered(_) => "tool_not_registered",
            Self::InvalidArguments { .. } => "invalid_arguments",
            Self::IterationBudgetExhausted(_) => "iteration_budget_exhausted",
            Self::Cancelled(_) => "cancelled",
            Self::Io { .. } => "io_error",
        }
    }

    /// Structured error descriptor sent to the model.
    pub fn to_payload(&self) -> Value {
        json!({
            "error": self.kind(),
            "message": self.to_string(),
        })
    }
}

/// Textual model output that could not be turned into tool calls.
///
/// Never surfaced to the caller; the extractor falls back to plain text.
#[derive(Debug, Error, PartialEq)]
pub enum MalformedToolCall {
    #[error("output is not JSON")]
    NotJson,

    #[error("JSON could not be repaired: {0}")]
    Unrepairable(String),

    #[error("expected a tool call object or array, found {0}")]
    WrongShape(&'static str),

    #[error("tool call #{index} is missing '{field}'")]
    MissingField { index: usize, field: &'static str },

    #[error("tool call #{index} has unusable arguments: {reason}")]
    BadArguments { index: usize, reason: String },

    #[error("no tool calls in output")]
    Empty,
}

/// Failure of the remote completion service. Fatal to the current exchange.
#[derive(Debug, Error)]
pub enum ModelInvocationError {
    #[error("no API key found for {provider}. Set {env_var} or configure it in config.toml")]
    MissingCredentials {
        provider: &'static str,
        env_var: &'static str,
    },

    #[error("failed to create {provider} client: {reason}")]
    Client {
        provider: &'static str,
        reason: String,
    },

    #[error("completion request failed: {0}")]
    Request(String),

    #[error("transcript has nothing to send")]
    EmptyTranscript,
}
