//! Centralized constants for scrivener.
//!
//! Default strings, limits and configuration constants live here so they
//! can be changed in one place.

/// Application name used in CLI output and directory paths.
pub const APP_NAME: &str = "scrivener";

// --- Provider defaults ---

/// Default provider when none is configured.
pub const DEFAULT_PROVIDER: &str = "openrouter";

/// Default model, served through OpenRouter.
pub const DEFAULT_MODEL: &str = "meta-llama/llama-3.1-8b-instruct";

pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-5";

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4.1";

/// Default base URL for local Ollama server.
pub const OLLAMA_DEFAULT_BASE_URL: &str = "http://localhost:11434";

pub const OLLAMA_DEFAULT_MODEL: &str = "llama3.1";

/// Maximum tokens for LLM completions.
pub const MAX_TOKENS: u64 = 4096;

// --- Loop ---

/// Model invocations allowed per exchange unless configured otherwise.
pub const DEFAULT_MAX_ITERATIONS: usize = 25;

/// Default system prompt prepended to all conversations.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are scrivener, an assistant that reads and edits files in the user's \
working directory. Use the tools to inspect files before changing them. \
Prefer edit_file for small text changes and write_encoded/append_encoded \
(base64 content) for new files or content with tricky quoting. Be concise.";

// --- Files ---

/// Configuration filename.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Per-project configuration filename.
pub const PROJECT_CONFIG_FILENAME: &str = "scrivener.toml";

/// Readline history filename.
pub const HISTORY_FILENAME: &str = "chat_history.txt";
