//! Environment variable substitution and per-provider lookups.

use super::types::{Config, ProviderEntry};
use crate::provider::ProviderKind;

impl Config {
    /// Resolve {env:VAR_NAME} patterns in string fields.
    pub(super) fn resolve_substitutions(&mut self) {
        if let Some(ref mut model) = self.model {
            *model = Self::resolve_str(model);
        }
        if let Some(ref mut sp) = self.system_prompt {
            *sp = Self::resolve_str(sp);
        }
        if let Some(ref mut dp) = self.default_provider {
            *dp = Self::resolve_str(dp);
        }
        Self::resolve_provider_entry(&mut self.provider.openai);
        Self::resolve_provider_entry(&mut self.provider.anthropic);
        Self::resolve_provider_entry(&mut self.provider.ollama);
        Self::resolve_provider_entry(&mut self.provider.openrouter);
    }

    /// Resolves `{env:VAR}` patterns in a single provider entry's `api_key` and `base_url`.
    fn resolve_provider_entry(entry: &mut Option<ProviderEntry>) {
        if let Some(ref mut e) = entry {
            if let Some(ref mut key) = e.api_key {
                *key = Self::resolve_str(key);
            }
            if let Some(ref mut url) = e.base_url {
                *url = Self::resolve_str(url);
            }
        }
    }

    /// Replace {env:VAR} with the environment variable value.
    /// Substituted values are not scanned again.
    fn resolve_str(s: &str) -> String {
        let mut result = s.to_string();
        let mut from = 0;
        while let Some(offset) = result[from..].find("{env:") {
            let start = from + offset;
            let Some(end) = result[start..].find('}') else {
                break;
            };
            let value = std::env::var(&result[start + 5..start + end]).unwrap_or_default();
            result.replace_range(start..start + end + 1, &value);
            from = start + value.len();
        }
        result
    }

    pub fn provider_entry(&self, provider: ProviderKind) -> Option<&ProviderEntry> {
        match provider {
            ProviderKind::OpenAI => self.provider.openai.as_ref(),
            ProviderKind::Anthropic => self.provider.anthropic.as_ref(),
            ProviderKind::Ollama => self.provider.ollama.as_ref(),
            ProviderKind::OpenRouter => self.provider.openrouter.as_ref(),
        }
    }

    /// Resolve API key for a provider: env var first, then config value.
    /// Empty values count as unset.
    pub fn resolve_api_key(&self, provider: ProviderKind) -> Option<String> {
        if let Ok(val) = std::env::var(provider.api_key_var()) {
            if !val.is_empty() {
                return Some(val);
            }
        }
        self.provider_entry(provider)
            .and_then(|e| e.api_key.clone())
            .filter(|key| !key.is_empty())
    }

    pub fn base_url(&self, provider: ProviderKind) -> Option<&str> {
        self.provider_entry(provider)
            .and_then(|e| e.base_url.as_deref())
            .filter(|url| !url.is_empty())
    }

    /// Get the configured default provider name, if any.
    pub fn provider_name(&self) -> Option<&str> {
        self.default_provider.as_deref()
    }

    /// Model configured for `provider`: its own entry first, then the
    /// top-level `model`. A top-level `other_provider/model` does not apply.
    pub fn model_for(&self, provider: ProviderKind) -> Option<String> {
        if let Some(model) = self.provider_entry(provider).and_then(|e| e.model.clone()) {
            return Some(model);
        }
        let model = self.model.as_deref()?;
        match model.split_once('/') {
            Some((prefix, rest)) => match ProviderKind::lookup(prefix) {
                Some(kind) if kind == provider => Some(rest.to_string()),
                Some(_) => None,
                None => Some(model.to_string()),
            },
            None => Some(model.to_string()),
        }
    }

    /// Model invocations allowed per exchange.
    pub fn max_iterations(&self) -> usize {
        self.agent
            .max_iterations
            .unwrap_or(crate::constants::DEFAULT_MAX_ITERATIONS)
            .max(1)
    }
}
