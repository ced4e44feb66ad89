//! Ollama LLM Provider
//!
//! Implementation of `LlmProvider` for local Ollama inference. Ollama has no
//! native tool declarations here; the orchestrator falls back to the fenced
//! ```tool text protocol.

use agent_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{
        Completion, FinishReason, GenerationOptions, LlmProvider, ModelInfo, ProviderInfo,
    },
};
use async_trait::async_trait;
use ollama_rs::{
    Ollama,
    generation::chat::{ChatMessage, MessageRole, request::ChatMessageRequest},
    models::ModelOptions,
};

/// Where the local Ollama daemon lives and which model to use
#[derive(Clone, Debug)]
pub struct OllamaConfig {
    /// Ollama host URL
    pub host: String,

    /// Ollama port
    pub port: u16,

    /// Model used when the caller does not override it
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".into(),
            port: 11434,
            model: "llama3.2".into(),
        }
    }
}

impl OllamaConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let host = std::env::var("OLLAMA_HOST").unwrap_or(defaults.host);
        let port = std::env::var("OLLAMA_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);
        let model = std::env::var("OLLAMA_MODEL").unwrap_or(defaults.model);

        Self { host, port, model }
    }
}

/// Ollama LLM provider
pub struct OllamaProvider {
    client: Ollama,
    config: OllamaConfig,
}

impl OllamaProvider {
    /// Connects to the configured host
    pub fn from_config(config: OllamaConfig) -> Self {
        Self {
            client: Ollama::new(config.host.clone(), config.port),
            config,
        }
    }

    /// Reads `OLLAMA_HOST`, `OLLAMA_PORT` and `OLLAMA_MODEL`
    pub fn from_env() -> Self {
        Self::from_config(OllamaConfig::from_env())
    }

    /// Default model for this provider
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Maps the conversation onto Ollama chat messages. Tool results go in as user text.
    fn convert_messages(messages: &[Message]) -> Vec<ChatMessage> {
        messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::System => MessageRole::System,
                    Role::Assistant => MessageRole::Assistant,
                    // Tools appear as user context
                    Role::User | Role::Tool => MessageRole::User,
                };
                ChatMessage::new(role, m.content.clone())
            })
            .collect()
    }

    /// Build Ollama model options; unset sampling knobs keep Ollama's defaults
    fn build_options(opts: &GenerationOptions) -> ModelOptions {
        let mut options =
            ModelOptions::default().num_predict(i32::try_from(opts.max_tokens).unwrap_or(i32::MAX));
        if let Some(temperature) = opts.temperature {
            options = options.temperature(temperature);
        }
        if let Some(top_p) = opts.top_p {
            options = options.top_p(top_p);
        }
        options
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn info(&self) -> Result<ProviderInfo> {
        let models = self.list_models().await.unwrap_or_default();

        Ok(ProviderInfo {
            name: "Ollama".into(),
            models,
            supports_tools: false,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        match self.client.list_local_models().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("Ollama health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let request = ChatMessageRequest::new(options.model.clone(), Self::convert_messages(messages))
            .options(Self::build_options(options));

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| AgentError::ProviderUnavailable(e.to_string()))?;

        Ok(Completion {
            content: response.message.content,
            model: options.model.clone(),
            finish_reason: Some(FinishReason::Stop),
            ..Default::default()
        })
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let models = self
            .client
            .list_local_models()
            .await
            .map_err(|e| AgentError::ProviderUnavailable(e.to_string()))?;

        Ok(models
            .into_iter()
            .map(|m| ModelInfo {
                id: m.name.clone(),
                name: m.name,
                context_length: None,
            })
            .collect())
    }
}
