//! Struct definitions and serde defaults for scrivener configuration.

use serde::{Deserialize, Serialize};

use crate::provider::ToolCallingMode;

/// Root configuration for scrivener, deserialized from `config.toml`.
///
/// Fields use serde defaults so scrivener can run with sensible defaults
/// when no config file exists.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Model identifier, optionally as `provider/model`. Falls back to the
    /// selected provider's default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Per-provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Default provider name (e.g., "openrouter", "anthropic").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<String>,
    /// System prompt that opens every conversation.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: Option<String>,
    /// Loop controller settings.
    #[serde(default)]
    pub agent: AgentConfig,
}

/// Returns the default system prompt for new conversations.
///
/// Used by serde's `#[serde(default)]` attribute during deserialization
/// so configs without an explicit `system_prompt` still get a sensible default.
pub(super) fn default_system_prompt() -> Option<String> {
    Some(crate::constants::DEFAULT_SYSTEM_PROMPT.to_string())
}

/// Provider-specific configuration map.
///
/// Each field corresponds to a supported LLM provider. Only providers
/// the user has configured will be `Some`.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ProviderConfig {
    pub openai: Option<ProviderEntry>,
    pub anthropic: Option<ProviderEntry>,
    pub ollama: Option<ProviderEntry>,
    pub openrouter: Option<ProviderEntry>,
}

/// Connection details for a single LLM provider.
///
/// Allows overriding the API key, endpoint URL, and model on a
/// per-provider basis.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ProviderEntry {
    /// API key for authentication. Environment variables take precedence.
    pub api_key: Option<String>,
    /// Custom base URL for the provider's API (useful for proxies or self-hosted instances).
    pub base_url: Option<String>,
    /// Model identifier to use with this provider, overriding the global default.
    pub model: Option<String>,
}

/// Settings for the model/tool loop.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AgentConfig {
    /// Maximum model invocations per exchange.
    pub max_iterations: Option<usize>,
    /// Force native or text tool calling regardless of provider.
    pub tool_calling: Option<ToolCallingMode>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: None,
            provider: ProviderConfig::default(),
            system_prompt: default_system_prompt(),
            default_provider: None,
            agent: AgentConfig::default(),
        }
    }
}
