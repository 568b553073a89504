mod openai;

use crate::types::{AssistantMessage, AssistantRole};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub use openai::OpenAiProvider;

/// Result type for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Response parsing failed: {0}")]
    ParseError(String),
}

/// One turn of a conversation as sent to the completion service
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub role: AssistantRole,
    pub content: String,
}

/// Request for a chat completion
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Optional instructions placed before the conversation
    pub system_prompt: Option<String>,
    /// Full conversation, oldest first
    pub messages: Vec<ChatTurn>,
    pub temperature: f32,
    /// Maximum response length in tokens
    pub max_tokens: u32,
    /// Timeout for the request
    pub timeout: Duration,
}

impl CompletionRequest {
    /// Build a request from a fellow's assistant thread. Only role and text
    /// are forwarded; timestamps stay local.
    pub fn from_history(history: &[AssistantMessage], config: &LlmConfig) -> Self {
        Self {
            system_prompt: config.system_prompt.clone(),
            messages: history
                .iter()
                .map(|m| ChatTurn {
                    role: m.role,
                    content: m.text.clone(),
                })
                .collect(),
            temperature: config.temperature,
            max_tokens: config.default_max_tokens,
            timeout: config.default_timeout,
        }
    }
}

/// Response from an LLM provider
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// The generated text
    pub text: String,
    pub metadata: ResponseMetadata,
}

/// Metadata about the LLM response
#[derive(Debug, Clone)]
pub struct ResponseMetadata {
    pub provider: String,
    pub model: String,
    /// Tokens consumed (if available)
    pub tokens_used: Option<u32>,
    pub latency_ms: u64,
}

/// Trait that all LLM providers must implement
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Continue the given conversation with one assistant turn
    async fn complete(&self, request: CompletionRequest) -> LlmResult<CompletionResponse>;

    /// Get the name of this provider
    fn name(&self) -> &str;
}

/// Configuration for the assistant backend
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// OpenAI API key
    pub openai_api_key: Option<String>,
    /// OpenAI model to use
    pub openai_model: String,
    /// Instructions prepended to every conversation
    pub system_prompt: Option<String>,
    /// Default timeout for LLM requests
    pub default_timeout: Duration,
    /// Default max tokens for responses
    pub default_max_tokens: u32,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            system_prompt: None,
            default_timeout: Duration::from_secs(30),
            default_max_tokens: 300,
            temperature: 0.7,
        }
    }
}

/// Read an env var, treating blank values as unset
fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

impl LlmConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            openai_api_key: env_non_empty("OPENAI_API_KEY"),
            openai_model: env_non_empty("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            system_prompt: env_non_empty("ASSISTANT_SYSTEM_PROMPT"),
            default_timeout: env_non_empty("LLM_TIMEOUT")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.default_timeout),
            default_max_tokens: env_non_empty("LLM_MAX_TOKENS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.default_max_tokens),
            temperature: env_non_empty("LLM_TEMPERATURE")
                .and_then(|s| s.parse().ok())
                .filter(|t: &f32| (0.0..=2.0).contains(t))
                .unwrap_or(defaults.temperature),
        }
    }

    /// Build the assistant provider. Fails when no credential is configured.
    pub fn build_provider(&self) -> LlmResult<Arc<dyn LlmProvider>> {
        match &self.openai_api_key {
            Some(api_key) => Ok(Arc::new(OpenAiProvider::new(
                api_key.clone(),
                self.openai_model.clone(),
            ))),
            None => Err(LlmError::ConfigError(
                "No assistant provider configured. Set OPENAI_API_KEY".to_string(),
            )),
        }
    }
}
