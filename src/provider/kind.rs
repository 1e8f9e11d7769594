//! Provider kind enumeration, per-provider defaults and tool-calling modes.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::constants;

/// Identifies which LLM provider to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Anthropic (Claude models).
    Anthropic,
    OpenAI,
    /// OpenRouter (multi-provider gateway).
    OpenRouter,
    /// Ollama (local models via OpenAI-compatible API).
    Ollama,
}

/// How tool calls travel between scrivener and the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ToolCallingMode {
    /// Tool definitions go in the request; calls come back structured.
    Native,
    /// Tools are described in the prompt; calls come back as JSON text.
    Text,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::Anthropic,
        ProviderKind::OpenAI,
        ProviderKind::OpenRouter,
        ProviderKind::Ollama,
    ];

    /// Parses a provider name string into a [`ProviderKind`].
    ///
    /// Matching is case-insensitive. Returns an error for unknown providers.
    pub fn from_str(s: &str) -> Result<Self> {
        Self::lookup(s).ok_or_else(|| {
            anyhow!("Unknown provider: {s}. Supported: anthropic, openai, openrouter, ollama")
        })
    }

    pub fn lookup(s: &str) -> Option<Self> {
        let s = s.to_lowercase();
        Self::ALL.into_iter().find(|kind| kind.name() == s)
    }

    pub fn name(self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenAI => "openai",
            ProviderKind::OpenRouter => "openrouter",
            ProviderKind::Ollama => "ollama",
        }
    }

    /// Environment variable checked first for this provider's API key.
    pub fn api_key_var(self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::OpenAI => "OPENAI_API_KEY",
            ProviderKind::OpenRouter => "OPENROUTER_API_KEY",
            ProviderKind::Ollama => "OLLAMA_API_KEY",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Anthropic => constants::DEFAULT_ANTHROPIC_MODEL,
            ProviderKind::OpenAI => constants::DEFAULT_OPENAI_MODEL,
            ProviderKind::OpenRouter => constants::DEFAULT_MODEL,
            ProviderKind::Ollama => constants::OLLAMA_DEFAULT_MODEL,
        }
    }

    /// Hosted APIs with reliable function calling use it natively; gateways
    /// and local models fall back to the text protocol.
    pub fn default_tool_calling(self) -> ToolCallingMode {
        match self {
            ProviderKind::Anthropic | ProviderKind::OpenAI => ToolCallingMode::Native,
            ProviderKind::OpenRouter | ProviderKind::Ollama => ToolCallingMode::Text,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
