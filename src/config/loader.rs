//! File loading and merging for scrivener configuration.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::types::{default_system_prompt, AgentConfig, Config, ProviderConfig, ProviderEntry};

/// Written to `config.toml` on first run.
const DEFAULT_CONFIG_TOML: &str = r#"# model = "meta-llama/llama-3.1-8b-instruct"
# default_provider = "openrouter"

[provider]

[provider.anthropic]
api_key = "{env:ANTHROPIC_API_KEY}"

[provider.openai]
api_key = "{env:OPENAI_API_KEY}"

[provider.openrouter]
api_key = "{env:OPENROUTER_API_KEY}"

[provider.ollama]
base_url = "http://localhost:11434"

[agent]
max_iterations = 25
# tool_calling = "text"
"#;

impl Config {
    /// Loads the global config from `~/.config/scrivener/config.toml`.
    ///
    /// If no config file exists, creates one with sensible defaults
    /// (including `{env:VAR}` placeholders for API keys) and returns it.
    pub(super) fn load_global() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, DEFAULT_CONFIG_TOML)
                .with_context(|| format!("Failed to write default config to {:?}", path))?;
            return toml::from_str(DEFAULT_CONFIG_TOML).context("Failed to parse default config");
        }
        Self::load_file(&path)
    }

    /// Look for scrivener.toml in current dir, then walk up to git root.
    pub(super) fn load_project() -> Result<Option<Config>> {
        let mut dir = std::env::current_dir()?;
        loop {
            let candidate = dir.join(crate::constants::PROJECT_CONFIG_FILENAME);
            if candidate.exists() {
                return Self::load_file(&candidate).map(Some);
            }
            // Stop at git root or filesystem root
            if dir.join(".git").exists() || !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    fn load_file(path: &Path) -> Result<Config> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse config at {:?}", path))
    }

    /// Merge project config over global config.
    /// Project values win when present.
    pub(super) fn merge(global: Config, project: Config) -> Config {
        Config {
            model: project.model.or(global.model),
            provider: ProviderConfig {
                openai: merge_entry(global.provider.openai, project.provider.openai),
                anthropic: merge_entry(global.provider.anthropic, project.provider.anthropic),
                ollama: merge_entry(global.provider.ollama, project.provider.ollama),
                openrouter: merge_entry(global.provider.openrouter, project.provider.openrouter),
            },
            // serde fills in the default prompt, so only a changed one overrides
            system_prompt: if project.system_prompt != default_system_prompt() {
                project.system_prompt
            } else {
                global.system_prompt
            },
            default_provider: project.default_provider.or(global.default_provider),
            agent: AgentConfig {
                max_iterations: project.agent.max_iterations.or(global.agent.max_iterations),
                tool_calling: project.agent.tool_calling.or(global.agent.tool_calling),
            },
        }
    }
}

fn merge_entry(global: Option<ProviderEntry>, project: Option<ProviderEntry>) -> Option<ProviderEntry> {
    match (global, project) {
        (Some(g), Some(p)) => Some(ProviderEntry {
            api_key: p.api_key.or(g.api_key),
            base_url: p.base_url.or(g.base_url),
            model: p.model.or(g.model),
        }),
        (g, p) => p.or(g),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ToolCallingMode;

    #[test]
    fn test_default_config_parses() {
        let config: Config = toml::from_str(DEFAULT_CONFIG_TOML).unwrap();
        assert_eq!(config.agent.max_iterations, Some(25));
        assert!(config.model.is_none());
        assert!(config.system_prompt.is_some());
        assert_eq!(
            config.provider.ollama.unwrap().base_url.as_deref(),
            Some("http://localhost:11434")
        );
    }

    #[test]
    fn test_project_values_win_field_by_field() {
        let global: Config = toml::from_str(
            r#"
model = "anthropic/claude-sonnet-4-5"
[provider.openrouter]
api_key = "global-key"
model = "global-model"
[agent]
max_iterations = 10
"#,
        )
        .unwrap();
        let project: Config = toml::from_str(
            r#"
[provider.openrouter]
model = "project-model"
[agent]
tool_calling = "native"
"#,
        )
        .unwrap();

        let merged = Config::merge(global, project);
        assert_eq!(merged.model.as_deref(), Some("anthropic/claude-sonnet-4-5"));
        let openrouter = merged.provider.openrouter.unwrap();
        assert_eq!(openrouter.api_key.as_deref(), Some("global-key"));
        assert_eq!(openrouter.model.as_deref(), Some("project-model"));
        assert_eq!(merged.agent.max_iterations, Some(10));
        assert_eq!(merged.agent.tool_calling, Some(ToolCallingMode::Native));
    }
}
