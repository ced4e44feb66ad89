//! Model backends
//!
//! Defines a common interface for all LLM providers (Gemini, Ollama, etc.)
//! allowing the orchestrator and decision tools to work with any backend.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_core::provider::{GenerationOptions, LlmProvider};
//!
//! let provider = GeminiProvider::from_env()?;
//! let completion = provider.complete(&messages, &GenerationOptions::default()).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::Message;
use crate::tool::{ToolCall, ToolSchema};

/// Sampling and tool settings sent with every call
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier (e.g., "gemini-2.0-flash", "llama3.2")
    pub model: String,

    /// Temperature for sampling; `None` leaves the provider default in place
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Output token cap
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Nucleus sampling cutoff
    #[serde(default)]
    pub top_p: Option<f32>,

    /// Stop sequences
    #[serde(default)]
    pub stop_sequences: Vec<String>,

    /// Tool declarations for providers with native function calling
    #[serde(default)]
    pub tools: Vec<ToolSchema>,
}

const fn default_max_tokens() -> u32 {
    2048
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".into(),
            temperature: None,
            max_tokens: default_max_tokens(),
            top_p: None,
            stop_sequences: Vec::new(),
            tools: Vec::new(),
        }
    }
}

impl GenerationOptions {
    /// Options for a given model with everything else defaulted
    pub fn for_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Same options with native tool declarations attached
    pub fn with_tools(mut self, tools: Vec<ToolSchema>) -> Self {
        self.tools = tools;
        self
    }
}

/// A single model reply
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Completion {
    /// The generated text
    pub content: String,

    /// Native tool calls returned alongside (or instead of) text
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,

    /// Model that answered
    pub model: String,

    /// Token counts, when the backend reports them
    pub usage: Option<TokenUsage>,

    /// Finish reason
    pub finish_reason: Option<FinishReason>,
}

impl Completion {
    /// Plain text completion
    pub fn text(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
            finish_reason: Some(FinishReason::Stop),
            ..Default::default()
        }
    }
}

/// Prompt and completion token counts
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Why the model stopped
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolUse,
    ContentFilter,
    Error,
}

/// Provider metadata
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Provider name (e.g., "Gemini", "Ollama")
    pub name: String,

    /// Available models
    pub models: Vec<ModelInfo>,

    /// Whether tool/function calling is supported natively
    pub supports_tools: bool,
}

/// A model the backend can serve
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub context_length: Option<u32>,
}

/// A chat-completion backend
///
/// The gateway is the only caller; tools never talk to a backend directly.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Backend name, model and capabilities
    async fn info(&self) -> Result<ProviderInfo>;

    /// Whether the backend answers and the credentials are accepted
    async fn health_check(&self) -> Result<bool>;

    /// One model call over the whole conversation
    async fn complete(&self, messages: &[Message], options: &GenerationOptions)
    -> Result<Completion>;

    /// List available models
    async fn list_models(&self) -> Result<Vec<ModelInfo>>;

    /// Whether `GenerationOptions::tools` is honoured as native function calling
    fn supports_native_tools(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_options_defaults() {
        let opts = GenerationOptions::default();
        assert_eq!(opts.temperature, None);
        assert_eq!(opts.max_tokens, 2048);
        assert_eq!(opts.model, "gemini-2.0-flash");
        assert!(opts.tools.is_empty());
    }

    #[test]
    fn test_text_completion_has_no_tool_calls() {
        let completion = Completion::text("hello", "m");
        assert!(completion.tool_calls.is_empty());
        assert_eq!(completion.finish_reason, Some(FinishReason::Stop));
    }
}
