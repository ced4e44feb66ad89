//! Gemini LLM Provider
//!
//! `LlmProvider` over the Gemini `generateContent` REST API with native
//! function calling. System messages become the system instruction; tool
//! results are passed back as user text, mirroring the Ollama mapping.

use std::time::Duration;

use agent_core::{
    ToolCall, ToolSchema,
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{
        Completion, FinishReason, GenerationOptions, LlmProvider, ModelInfo, ProviderInfo,
        TokenUsage,
    },
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Stand-in text for a turn the model left empty
const EMPTY_TURN: &str = "(no response)";

/// Gemini provider configuration
#[derive(Clone, Debug)]
pub struct GeminiConfig {
    /// API key (`x-goog-api-key`)
    pub api_key: String,

    /// Model used when the caller does not override it
    pub model: String,

    /// API root, overridable for proxies and tests
    pub base_url: String,

    /// Per-request HTTP timeout
    pub timeout: Duration,
}

impl GeminiConfig {
    pub const DEFAULT_MODEL: &'static str = "gemini-2.0-flash";
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: Self::DEFAULT_MODEL.into(),
            base_url: Self::DEFAULT_BASE_URL.into(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Read `GEMINI_API_KEY` (or `GOOGLE_API_KEY`), `GEMINI_MODEL`, `GEMINI_BASE_URL`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("GOOGLE_API_KEY"))
            .map_err(|_| AgentError::Config("GEMINI_API_KEY is not set".into()))?;

        let mut config = Self::new(api_key);
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            config.model = model;
        }
        if let Ok(base_url) = std::env::var("GEMINI_BASE_URL") {
            config.base_url = base_url;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(AgentError::Config("Gemini API key is empty".into()));
        }
        if self.model.trim().is_empty() {
            return Err(AgentError::Config("Gemini model is empty".into()));
        }
        Ok(())
    }
}

/// Gemini LLM provider
pub struct GeminiProvider {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    pub fn from_config(config: GeminiConfig) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AgentError::Config(format!("HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_config(GeminiConfig::from_env()?)
    }

    /// Default model for this provider
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }

    fn build_request(messages: &[Message], options: &GenerationOptions) -> GenerateRequest {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::System && !m.content.trim().is_empty())
            .map(|m| m.content.as_str())
            .collect();

        // Gemini rejects empty text parts; a blank turn (safety or length
        // stop) is kept as a placeholder so roles still alternate.
        let contents = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| Content {
                role: Some(if m.role == Role::Assistant { "model" } else { "user" }.into()),
                parts: vec![Part::text(if m.content.trim().is_empty() {
                    EMPTY_TURN
                } else {
                    m.content.as_str()
                })],
            })
            .collect();

        let tools = if options.tools.is_empty() {
            Vec::new()
        } else {
            vec![json!({
                "functionDeclarations": options.tools.iter().map(function_declaration).collect::<Vec<_>>()
            })]
        };

        GenerateRequest {
            system_instruction: (!system.is_empty()).then(|| Content {
                role: None,
                parts: vec![Part::text(system.join("\n\n"))],
            }),
            contents,
            tools,
            generation_config: GenerationConfig {
                temperature: options.temperature,
                top_p: options.top_p,
                max_output_tokens: options.max_tokens,
                stop_sequences: options.stop_sequences.clone(),
            },
        }
    }

    fn convert_response(response: GenerateResponse, model: &str) -> Result<Completion> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Provider("Gemini returned no candidates".into()))?;

        let mut content = String::new();
        let mut tool_calls = Vec::new();
        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            if let Some(text) = part.text {
                content.push_str(&text);
            }
            if let Some(call) = part.function_call {
                let arguments = match call.args {
                    Value::Object(map) => map.into_iter().collect(),
                    _ => Default::default(),
                };
                tool_calls.push(ToolCall {
                    name: call.name,
                    arguments,
                    id: None,
                });
            }
        }

        let finish_reason = if tool_calls.is_empty() {
            candidate.finish_reason.as_deref().map(|r| match r {
                "STOP" => FinishReason::Stop,
                "MAX_TOKENS" => FinishReason::Length,
                "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" => {
                    FinishReason::ContentFilter
                }
                _ => FinishReason::Error,
            })
        } else {
            Some(FinishReason::ToolUse)
        };

        Ok(Completion {
            content,
            tool_calls,
            model: model.to_string(),
            usage: response.usage_metadata.map(|u| TokenUsage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            }),
            finish_reason,
        })
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(match status.as_u16() {
            401 | 403 => AgentError::Auth(body),
            429 => AgentError::RateLimited(body),
            500..=599 => AgentError::ProviderUnavailable(format!("HTTP {status}: {body}")),
            _ => AgentError::Provider(format!("HTTP {status}: {body}")),
        })
    }
}

fn transport_error(e: &reqwest::Error) -> AgentError {
    if e.is_timeout() {
        AgentError::Timeout(e.to_string())
    } else if e.is_connect() {
        AgentError::ProviderUnavailable(e.to_string())
    } else {
        AgentError::Provider(e.to_string())
    }
}

fn function_declaration(schema: &ToolSchema) -> Value {
    let properties: serde_json::Map<String, Value> = schema
        .parameters
        .iter()
        .map(|p| {
            (
                p.name.clone(),
                json!({ "type": p.param_type.to_uppercase(), "description": p.description }),
            )
        })
        .collect();
    let required: Vec<&str> = schema
        .parameters
        .iter()
        .filter(|p| p.required)
        .map(|p| p.name.as_str())
        .collect();

    json!({
        "name": schema.name,
        "description": schema.description,
        "parameters": { "type": "OBJECT", "properties": properties, "required": required },
    })
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn info(&self) -> Result<ProviderInfo> {
        let models = self.list_models().await.unwrap_or_default();
        Ok(ProviderInfo {
            name: "Gemini".into(),
            models,
            supports_tools: true,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        match self.list_models().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("Gemini health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let body = Self::build_request(messages, options);

        let response = self
            .http
            .post(self.endpoint(&options.model))
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let parsed: GenerateResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("Malformed Gemini response: {e}")))?;

        Self::convert_response(parsed, &options.model)
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = format!("{}/v1beta/models", self.config.base_url.trim_end_matches('/'));
        let response = self
            .http
            .get(url)
            .header("x-goog-api-key", &self.config.api_key)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let listing: ModelList = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| AgentError::Provider(e.to_string()))?;

        Ok(listing
            .models
            .into_iter()
            .map(|m| ModelInfo {
                id: m.name.trim_start_matches("models/").to_string(),
                name: m.display_name.unwrap_or(m.name),
                context_length: m.input_token_limit,
            })
            .collect())
    }

    fn supports_native_tools(&self) -> bool {
        true
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            function_call: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop_sequences: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<RemoteModel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteModel {
    name: String,
    display_name: Option<String>,
    input_token_limit: Option<u32>,
}
