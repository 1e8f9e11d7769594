//! Model resolution logic for scrivener.
//!
//! Resolves which provider, model and tool-calling mode to use based on CLI
//! flags, config file, and hardcoded defaults. Supports `provider/model`
//! shorthand syntax.

use anyhow::Result;

use super::kind::{ProviderKind, ToolCallingMode};
use crate::config::Config;
use crate::constants::DEFAULT_PROVIDER;

/// Resolved provider + model pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSelection {
    pub provider: ProviderKind,
    pub model: String,
    pub tool_calling: ToolCallingMode,
}

/// Resolve which provider and model to use.
/// Priority: CLI flags > config.toml > defaults.
///
/// Accepts these formats:
///   --model anthropic/claude-sonnet-4-5  (provider/model shorthand, only when --provider is omitted)
///   --model meta-llama/llama-3.1-8b-instruct  (unknown prefix, kept whole as the model name)
///   --provider anthropic --model claude-sonnet-4-5
///   --provider anthropic  (uses provider's default model)
///   (nothing)  (uses config.toml, then hardcoded default)
pub fn resolve_model(
    cli_provider: Option<&str>,
    cli_model: Option<&str>,
    cli_tool_calling: Option<ToolCallingMode>,
    config: &Config,
) -> Result<ModelSelection> {
    let (provider, model) = match (cli_provider, cli_model) {
        (Some(prov), model) => {
            let provider = ProviderKind::from_str(prov)?;
            let model = model
                .map(String::from)
                .or_else(|| config.model_for(provider))
                .unwrap_or_else(|| provider.default_model().to_string());
            (provider, model)
        }
        (None, Some(model)) => match split_provider(model) {
            Some(pair) => pair,
            None => (configured_provider(config)?, model.to_string()),
        },
        (None, None) => {
            let provider = match config.model.as_deref().and_then(split_provider) {
                Some((provider, _)) => provider,
                None => configured_provider(config)?,
            };
            let model = config
                .model_for(provider)
                .unwrap_or_else(|| provider.default_model().to_string());
            (provider, model)
        }
    };

    let tool_calling = cli_tool_calling
        .or(config.agent.tool_calling)
        .unwrap_or_else(|| provider.default_tool_calling());

    Ok(ModelSelection {
        provider,
        model,
        tool_calling,
    })
}

fn configured_provider(config: &Config) -> Result<ProviderKind> {
    ProviderKind::from_str(config.provider_name().unwrap_or(DEFAULT_PROVIDER))
}

/// Splits `provider/model` when the prefix names a known provider.
fn split_provider(model: &str) -> Option<(ProviderKind, String)> {
    let (prefix, rest) = model.split_once('/')?;
    let provider = ProviderKind::lookup(prefix)?;
    Some((provider, rest.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_openrouter_in_text_mode() {
        let selection = resolve_model(None, None, None, &Config::default()).unwrap();
        assert_eq!(selection.provider, ProviderKind::OpenRouter);
        assert_eq!(selection.model, crate::constants::DEFAULT_MODEL);
        assert_eq!(selection.tool_calling, ToolCallingMode::Text);
    }

    #[test]
    fn test_known_prefix_selects_provider() {
        let selection =
            resolve_model(None, Some("anthropic/claude-sonnet-4-5"), None, &Config::default())
                .unwrap();
        assert_eq!(selection.provider, ProviderKind::Anthropic);
        assert_eq!(selection.model, "claude-sonnet-4-5");
        assert_eq!(selection.tool_calling, ToolCallingMode::Native);
    }

    #[test]
    fn test_unknown_prefix_is_part_of_model_name() {
        let selection =
            resolve_model(None, Some("qwen/qwen-2.5-coder"), None, &Config::default()).unwrap();
        assert_eq!(selection.provider, ProviderKind::OpenRouter);
        assert_eq!(selection.model, "qwen/qwen-2.5-coder");
    }

    #[test]
    fn test_tool_calling_precedence() {
        let mut config = Config::default();
        config.agent.tool_calling = Some(ToolCallingMode::Native);
        let selection = resolve_model(None, None, None, &config).unwrap();
        assert_eq!(selection.tool_calling, ToolCallingMode::Native);

        let selection = resolve_model(None, None, Some(ToolCallingMode::Text), &config).unwrap();
        assert_eq!(selection.tool_calling, ToolCallingMode::Text);
    }

    #[test]
    fn test_explicit_provider_uses_its_default_model() {
        let selection = resolve_model(Some("ollama"), None, None, &Config::default()).unwrap();
        assert_eq!(selection.model, crate::constants::OLLAMA_DEFAULT_MODEL);
    }
}
