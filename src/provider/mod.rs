//! LLM provider abstraction for scrivener.
//!
//! Wraps rig-core's provider clients behind a [`Provider`] struct with enum
//! dispatch, keeping provider-specific details out of the loop controller.
//! Supports Anthropic, OpenAI, OpenRouter, and Ollama (local) via
//! [`ProviderKind`].

mod client;
mod kind;
mod resolve;

pub use client::Provider;
pub use kind::{ProviderKind, ToolCallingMode};
pub use resolve::resolve_model;
