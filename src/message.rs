//! Message and transcript types for scrivener's conversation history.
//!
//! [`Message`] is scrivener's internal representation of one conversation
//! turn; it is converted to provider-specific formats (e.g. rig-core's
//! `Message`) only when sent to the LLM. [`Transcript`] is the append-only
//! sequence of messages owned by one conversation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ToolError;

/// A tool invocation requested by the LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier unique within the assistant turn (used to match results).
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// JSON object of arguments.
    pub arguments: Value,
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// The role of a message sender in the conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Message {
    fn new(role: Role, content: Option<String>) -> Self {
        Self {
            role,
            content,
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, Some(text.into()))
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, Some(text.into()))
    }

    /// Creates an assistant message that requests tool calls.
    ///
    /// Empty text is stored as `None` so tool-only turns carry no content.
    pub fn assistant_with_calls(text: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        let text = text.into();
        Self {
            role: Role::Assistant,
            content: (!text.is_empty()).then_some(text),
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Creates a tool result message to feed back to the LLM.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// Returns the text content, or `""` when the message has none.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// Append-only conversation history.
///
/// Messages can only be added at the end; nothing already appended is
/// modified or removed.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Starts a transcript with a system prompt.
    pub fn with_system(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(prompt)],
        }
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Tool calls of the trailing assistant message that have no result yet.
    ///
    /// Results are matched positionally: the tool messages after the
    /// assistant message answer its calls in request order.
    pub fn pending_calls(&self) -> &[ToolCall] {
        let Some(pos) = self
            .messages
            .iter()
            .rposition(|m| m.role == Role::Assistant)
        else {
            return &[];
        };
        let calls = &self.messages[pos].tool_calls;
        let answered = self.messages[pos + 1..]
            .iter()
            .take_while(|m| m.role == Role::Tool)
            .count();
        &calls[answered.min(calls.len())..]
    }

    /// Appends an error result for every unanswered call of the trailing
    /// assistant message. Returns how many results were appended.
    pub fn close_pending_calls(&mut self, reason: &str) -> usize {
        let pending: Vec<String> = self.pending_calls().iter().map(|c| c.id.clone()).collect();
        for id in &pending {
            let payload = ToolError::Cancelled(reason.to_string()).to_payload();
            self.append(Message::tool_result(id.clone(), payload.to_string()));
        }
        pending.len()
    }
}
