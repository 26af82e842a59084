//! Centralized model definitions for all LLM providers

use super::anthropic::{AnthropicModel, AnthropicService};
use super::openai::{OpenAIModel, OpenAIService};
use super::{LlmError, LlmService};
use std::sync::Arc;
use std::time::Duration;

/// LLM provider enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Anthropic,
    OpenAI,
}

impl Provider {
    /// Get the display name for this provider
    pub fn display_name(self) -> &'static str {
        match self {
            Provider::Anthropic => "Anthropic",
            Provider::OpenAI => "OpenAI",
        }
    }

    /// Get the environment variable name for this provider's API key
    pub fn api_key_env_var(self) -> &'static str {
        match self {
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::OpenAI => "OPENAI_API_KEY",
        }
    }
}

/// Factory signature: (api key, gateway, request timeout)
pub type ModelFactory = fn(&str, Option<&str>, Duration) -> Result<Arc<dyn LlmService>, LlmError>;

/// Model definition with metadata
#[derive(Debug, Clone)]
pub struct ModelDef {
    /// User-facing model ID (e.g., "gpt-4o-mini")
    pub id: &'static str,
    pub provider: Provider,
    /// Human-readable description
    pub description: &'static str,
    /// Factory function to create the service
    pub factory: ModelFactory,
}

/// Get all available model definitions, in order of preference
pub fn all_models() -> &'static [ModelDef] {
    &[
        ModelDef {
            id: "gpt-4o-mini",
            provider: Provider::OpenAI,
            description: "GPT-4o mini (fast, inexpensive)",
            factory: |api_key, gateway, timeout| {
                Ok(Arc::new(OpenAIService::new(
                    api_key.to_string(),
                    OpenAIModel::GPT4oMini,
                    gateway,
                    timeout,
                )?))
            },
        },
        ModelDef {
            id: "gpt-4o",
            provider: Provider::OpenAI,
            description: "GPT-4o (balanced)",
            factory: |api_key, gateway, timeout| {
                Ok(Arc::new(OpenAIService::new(
                    api_key.to_string(),
                    OpenAIModel::GPT4o,
                    gateway,
                    timeout,
                )?))
            },
        },
        ModelDef {
            id: "gpt-5-mini",
            provider: Provider::OpenAI,
            description: "GPT-5 mini",
            factory: |api_key, gateway, timeout| {
                Ok(Arc::new(OpenAIService::new(
                    api_key.to_string(),
                    OpenAIModel::GPT5Mini,
                    gateway,
                    timeout,
                )?))
            },
        },
        ModelDef {
            id: "claude-4.5-haiku",
            provider: Provider::Anthropic,
            description: "Claude Haiku 4.5 (fast, efficient)",
            factory: |api_key, gateway, timeout| {
                Ok(Arc::new(AnthropicService::new(
                    api_key.to_string(),
                    AnthropicModel::Claude45Haiku,
                    gateway,
                    timeout,
                )?))
            },
        },
        ModelDef {
            id: "claude-4.5-sonnet",
            provider: Provider::Anthropic,
            description: "Claude Sonnet 4.5 (balanced performance)",
            factory: |api_key, gateway, timeout| {
                Ok(Arc::new(AnthropicService::new(
                    api_key.to_string(),
                    AnthropicModel::Claude45Sonnet,
                    gateway,
                    timeout,
                )?))
            },
        },
    ]
}
