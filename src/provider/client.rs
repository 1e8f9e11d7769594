//! LLM provider client and the production [`ModelBackend`].
//!
//! Contains the [`Provider`] struct which wraps rig-core provider clients
//! behind enum dispatch, keeping provider-specific details out of the loop
//! controller. Supports Anthropic, OpenAI, OpenRouter, and Ollama.

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::{CompletionModel, ToolDefinition as RigToolDefinition};
use rig::message::{
    AssistantContent, Message as RigMessage, Text, ToolCall as RigToolCall, ToolFunction,
};
use rig::providers::{anthropic, openai, openrouter};
use rig::OneOrMany;
use serde_json::json;
use tracing::{debug, warn};

use super::kind::{ProviderKind, ToolCallingMode};
use super::resolve::ModelSelection;
use crate::agent::ModelBackend;
use crate::config::Config;
use crate::constants::{MAX_TOKENS, OLLAMA_DEFAULT_BASE_URL};
use crate::error::ModelInvocationError;
use crate::extract::ModelReply;
use crate::message::{Message, Role, ToolCall, Transcript};
use crate::tools::{text_protocol_preamble, ToolDefinition};

/// Internal enum wrapping provider-specific clients.
enum ClientKind {
    Anthropic(anthropic::Client),
    OpenAI(openai::Client),
    OpenRouter(openrouter::Client),
    Ollama(openai::Client),
}

/// A configured LLM provider ready to handle completion requests.
///
/// Holds a rig-core client, the target model name and how tool calls are
/// exchanged with it. One request is built per model invocation; the whole
/// transcript is sent every time.
pub struct Provider {
    client: ClientKind,
    kind: ProviderKind,
    model: String,
    tool_calling: ToolCallingMode,
}

/// Dispatches an operation across provider-specific clients.
///
/// Matches on [`ClientKind`] and executes the same block for each variant,
/// letting the compiler monomorphize per provider.
macro_rules! dispatch {
    ($self:expr, |$client:ident| $body:expr) => {
        match &$self.client {
            ClientKind::Anthropic($client) => $body,
            ClientKind::OpenAI($client) => $body,
            ClientKind::OpenRouter($client) => $body,
            ClientKind::Ollama($client) => $body,
        }
    };
}

impl Provider {
    /// Creates a new [`Provider`] from the loaded application config.
    ///
    /// Resolves the API key through scrivener's config precedence chain
    /// (env var → config file → substitution) and builds the matching
    /// rig-core client. Ollama needs no key.
    ///
    /// # Errors
    ///
    /// [`ModelInvocationError::MissingCredentials`] if no API key is found
    /// for the selected provider, [`ModelInvocationError::Client`] if client
    /// construction fails.
    pub fn from_config(
        config: &Config,
        selection: &ModelSelection,
    ) -> Result<Self, ModelInvocationError> {
        let kind = selection.provider;
        let client_err = |e: &dyn std::fmt::Display| ModelInvocationError::Client {
            provider: kind.name(),
            reason: e.to_string(),
        };

        let client = match kind {
            ProviderKind::Ollama => {
                let base_url = config.base_url(kind).unwrap_or(OLLAMA_DEFAULT_BASE_URL);
                let client = openai::Client::builder()
                    .api_key("ollama")
                    .base_url(format!("{}/v1", base_url.trim_end_matches('/')))
                    .build()
                    .map_err(|e| client_err(&e))?;
                ClientKind::Ollama(client)
            }
            _ => {
                let api_key = config.resolve_api_key(kind).ok_or(
                    ModelInvocationError::MissingCredentials {
                        provider: kind.name(),
                        env_var: kind.api_key_var(),
                    },
                )?;
                match kind {
                    ProviderKind::Anthropic => ClientKind::Anthropic(
                        anthropic::Client::new(&api_key).map_err(|e| client_err(&e))?,
                    ),
                    ProviderKind::OpenRouter => ClientKind::OpenRouter(
                        openrouter::Client::new(&api_key).map_err(|e| client_err(&e))?,
                    ),
                    _ => match config.base_url(kind) {
                        Some(base_url) => ClientKind::OpenAI(
                            openai::Client::builder()
                                .api_key(api_key.as_str())
                                .base_url(base_url)
                                .build()
                                .map_err(|e| client_err(&e))?,
                        ),
                        None => ClientKind::OpenAI(
                            openai::Client::new(&api_key).map_err(|e| client_err(&e))?,
                        ),
                    },
                }
            }
        };

        Ok(Self {
            client,
            kind,
            model: selection.model.clone(),
            tool_calling: selection.tool_calling,
        })
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn tool_calling(&self) -> ToolCallingMode {
        self.tool_calling
    }
}

#[async_trait]
impl ModelBackend for Provider {
    async fn complete(
        &self,
        transcript: &Transcript,
        tools: &[ToolDefinition],
    ) -> Result<ModelReply, ModelInvocationError> {
        let mode = self.tool_calling;
        let preamble = build_preamble(transcript, tools, mode);

        let mut history: Vec<RigMessage> = transcript
            .messages()
            .iter()
            .filter_map(|m| convert_message_to_rig(m, mode))
            .collect();
        let prompt = history.pop().ok_or(ModelInvocationError::EmptyTranscript)?;

        let rig_tools: Vec<RigToolDefinition> = match mode {
            ToolCallingMode::Native => tools
                .iter()
                .map(|d| RigToolDefinition {
                    name: d.name.clone(),
                    description: d.description.clone(),
                    parameters: d.parameters.clone(),
                })
                .collect(),
            ToolCallingMode::Text => Vec::new(),
        };

        debug!(
            provider = %self.kind,
            model = %self.model,
            history = history.len(),
            native_tools = rig_tools.len(),
            "sending completion request"
        );

        let choice = dispatch!(self, |client| {
            let model = client.completion_model(self.model.as_str());
            let mut request = model
                .completion_request(prompt)
                .messages(history)
                .max_tokens(MAX_TOKENS);
            if !preamble.is_empty() {
                request = request.preamble(preamble);
            }
            if !rig_tools.is_empty() {
                request = request.tools(rig_tools);
            }
            request
                .send()
                .await
                .map_err(|e| ModelInvocationError::Request(e.to_string()))?
                .choice
        });

        Ok(reply_from_choice(choice, mode))
    }
}

/// System messages joined, plus the tool catalogue in text mode.
fn build_preamble(transcript: &Transcript, tools: &[ToolDefinition], mode: ToolCallingMode) -> String {
    let mut preamble = transcript
        .messages()
        .iter()
        .filter(|m| m.role == Role::System)
        .map(Message::text)
        .collect::<Vec<_>>()
        .join("\n\n");
    if mode == ToolCallingMode::Text && !tools.is_empty() {
        if !preamble.is_empty() {
            preamble.push_str("\n\n");
        }
        preamble.push_str(&text_protocol_preamble(tools));
    }
    preamble
}

/// Splits the response content into text and structured tool calls.
///
/// Blank output is a valid reply: it carries no calls, so the exchange ends.
fn reply_from_choice(choice: OneOrMany<AssistantContent>, mode: ToolCallingMode) -> ModelReply {
    let mut text = String::new();
    let mut calls = Vec::new();
    for item in choice {
        match item {
            AssistantContent::Text(t) => text.push_str(&t.text),
            AssistantContent::ToolCall(tc) => calls.push(ToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: tc.function.arguments,
            }),
            _ => {}
        }
    }

    if mode == ToolCallingMode::Text && calls.is_empty() {
        return ModelReply::Text(text);
    }
    if mode == ToolCallingMode::Text {
        warn!("model returned native tool calls in text mode; using them as-is");
    }
    ModelReply::Structured { text, calls }
}

/// Converts a scrivener [`Message`] to a rig-core [`RigMessage`].
///
/// - **User** → `RigMessage::User` with text content
/// - **Assistant** → text, plus `ToolCall` items in native mode or the calls
///   re-serialized as the JSON wire shape in text mode
/// - **Tool** → a `ToolResult` item in native mode, a labelled user message
///   in text mode
/// - **System** → `None` (system messages become the preamble)
fn convert_message_to_rig(msg: &Message, mode: ToolCallingMode) -> Option<RigMessage> {
    match (msg.role, mode) {
        (Role::System, _) => None,
        (Role::User, _) => Some(RigMessage::user(msg.text())),
        (Role::Assistant, _) if msg.tool_calls.is_empty() => {
            Some(RigMessage::assistant(msg.text()))
        }
        (Role::Assistant, ToolCallingMode::Native) => {
            let mut items: Vec<AssistantContent> = Vec::new();
            if !msg.text().is_empty() {
                items.push(AssistantContent::Text(Text {
                    text: msg.text().to_string(),
                }));
            }
            for tc in &msg.tool_calls {
                items.push(AssistantContent::ToolCall(RigToolCall::new(
                    tc.id.clone(),
                    ToolFunction::new(tc.name.clone(), tc.arguments.clone()),
                )));
            }
            Some(RigMessage::Assistant {
                id: None,
                content: OneOrMany::many(items)
                    .unwrap_or_else(|_| OneOrMany::one(AssistantContent::text(""))),
            })
        }
        (Role::Assistant, ToolCallingMode::Text) => {
            let wire: Vec<_> = msg
                .tool_calls
                .iter()
                .map(|tc| {
                    json!({
                        "id": tc.id,
                        "type": "function",
                        "function": {"name": tc.name, "arguments": tc.arguments},
                    })
                })
                .collect();
            let calls = serde_json::Value::Array(wire).to_string();
            let text = match msg.text() {
                "" => calls,
                prose => format!("{prose}\n{calls}"),
            };
            Some(RigMessage::assistant(text))
        }
        (Role::Tool, mode) => {
            let Some(id) = msg.tool_call_id.as_deref() else {
                warn!("tool message without a call id; sending it as user text");
                return Some(RigMessage::user(msg.text()));
            };
            Some(match mode {
                ToolCallingMode::Native => RigMessage::tool_result(id, msg.text()),
                ToolCallingMode::Text => {
                    RigMessage::user(format!("Result of tool call {id}:\n{}", msg.text()))
                }
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rig::message::UserContent;

    fn call_message() -> Message {
        Message::assistant_with_calls(
            "",
            vec![ToolCall {
                id: "c1".into(),
                name: "read_file".into(),
                arguments: json!({"path": "a.txt"}),
            }],
        )
    }

    #[test]
    fn test_text_mode_replays_calls_as_wire_json() {
        let Some(RigMessage::Assistant { content, .. }) =
            convert_message_to_rig(&call_message(), ToolCallingMode::Text)
        else {
            panic!("expected assistant message");
        };
        let AssistantContent::Text(Text { text }) = content.first() else {
            panic!("expected text content");
        };
        let turn = crate::extract::from_text(&text);
        assert_eq!(turn.calls[0].id, "c1");
        assert_eq!(turn.calls[0].arguments, json!({"path": "a.txt"}));
    }

    #[test]
    fn test_native_mode_sends_tool_results() {
        let result = Message::tool_result("c1", r#"{"content": "x"}"#);
        let Some(RigMessage::User { content, .. }) =
            convert_message_to_rig(&result, ToolCallingMode::Native)
        else {
            panic!("expected user message");
        };
        assert!(matches!(content.first(), UserContent::ToolResult(_)));
    }

    #[test]
    fn test_system_messages_become_preamble() {
        let transcript = Transcript::with_system("Be brief.");
        let tools = crate::tools::ToolRegistry::new(".".into()).definitions();
        assert_eq!(
            build_preamble(&transcript, &tools, ToolCallingMode::Native),
            "Be brief."
        );
        let text = build_preamble(&transcript, &tools, ToolCallingMode::Text);
        assert!(text.starts_with("Be brief.\n\n"));
        assert!(text.contains("append_encoded"));
        assert!(convert_message_to_rig(&Message::system("x"), ToolCallingMode::Text).is_none());
    }

    #[test]
    fn test_blank_choice_is_a_reply_without_calls() {
        let blank = || OneOrMany::one(AssistantContent::text("   \n"));
        assert_eq!(
            reply_from_choice(blank(), ToolCallingMode::Text),
            ModelReply::Text("   \n".into())
        );
        assert_eq!(
            reply_from_choice(blank(), ToolCallingMode::Native),
            ModelReply::Structured {
                text: "   \n".into(),
                calls: Vec::new(),
            }
        );
        let turn = crate::extract::extract(reply_from_choice(blank(), ToolCallingMode::Text));
        assert!(turn.calls.is_empty());

        let choice = OneOrMany::one(AssistantContent::text("[]"));
        assert_eq!(
            reply_from_choice(choice, ToolCallingMode::Text),
            ModelReply::Text("[]".into())
        );
    }
}
