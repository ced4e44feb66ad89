//! # agent-runtime
//!
//! Concrete `LlmProvider` backends.
//!
//! ## Providers
//!
//! - **Gemini** (default): hosted inference with native function calling
//! - **Ollama**: local inference, tools via the fenced text protocol
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::provider_from_env;
//!
//! let (provider, options) = provider_from_env()?;
//! let gateway = ModelGateway::new(provider, options);
//! ```

pub mod gemini;

#[cfg(feature = "ollama")]
pub mod ollama;

use std::str::FromStr;
use std::sync::Arc;

use agent_core::{AgentError, GenerationOptions, LlmProvider, Result};

pub use gemini::{GeminiConfig, GeminiProvider};

#[cfg(feature = "ollama")]
pub use ollama::{OllamaConfig, OllamaProvider};

/// Which backend `provider_from_env` builds
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProviderKind {
    #[default]
    Gemini,
    Ollama,
}

impl FromStr for ProviderKind {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            other => Err(AgentError::Config(format!("Unknown LLM_PROVIDER: {other}"))),
        }
    }
}

impl ProviderKind {
    /// Read `LLM_PROVIDER`, defaulting to Gemini
    pub fn from_env() -> Result<Self> {
        std::env::var("LLM_PROVIDER").map_or_else(|_| Ok(Self::default()), |v| v.parse())
    }
}

/// Build the configured provider together with generation options
/// targeting its default model.
pub fn provider_from_env() -> Result<(Arc<dyn LlmProvider>, GenerationOptions)> {
    match ProviderKind::from_env()? {
        ProviderKind::Gemini => {
            let provider = GeminiProvider::from_env()?;
            let options = GenerationOptions::for_model(provider.model());
            tracing::info!(model = %provider.model(), "Using Gemini provider");
            Ok((Arc::new(provider), options))
        }
        #[cfg(feature = "ollama")]
        ProviderKind::Ollama => {
            let provider = OllamaProvider::from_env();
            let options = GenerationOptions::for_model(provider.model());
            tracing::info!(model = %provider.model(), "Using Ollama provider");
            Ok((Arc::new(provider), options))
        }
        #[cfg(not(feature = "ollama"))]
        ProviderKind::Ollama => Err(AgentError::Config(
            "agent-runtime was built without the `ollama` feature".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("Gemini".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert_eq!(" ollama ".parse::<ProviderKind>().unwrap(), ProviderKind::Ollama);
        assert!("openai".parse::<ProviderKind>().is_err());
    }
}
