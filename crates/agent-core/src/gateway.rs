//! Model Gateway
//!
//! Single entry point for every model call in a run: decision tools use
//! [`ModelGateway::invoke`] for one-shot prompts, the orchestrator uses
//! [`ModelGateway::complete`] for conversational turns. Both are bounded by a
//! per-call timeout and retried with exponential backoff on transient errors.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::provider::{Completion, GenerationOptions, LlmProvider};

/// Exponential backoff for retryable provider failures
#[derive(Clone, Debug)]
pub struct BackoffConfig {
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Maximum delay between attempts
    pub max_delay: Duration,
    /// Multiplier per consecutive failure
    pub multiplier: f64,
    /// Total attempts including the first (1 disables retries)
    pub max_attempts: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            multiplier: 2.0,
            max_attempts: 3,
        }
    }
}

impl BackoffConfig {
    /// No retries at all
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Delay after the given number of consecutive failures (1-based)
    pub fn delay_for(&self, failures: u32) -> Duration {
        let exponent = i32::try_from(failures.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }
}

/// Wraps an `LlmProvider` with timeouts, retries and default options
#[derive(Clone)]
pub struct ModelGateway {
    provider: Arc<dyn LlmProvider>,
    options: GenerationOptions,
    call_timeout: Duration,
    backoff: BackoffConfig,
}

impl ModelGateway {
    pub fn new(provider: Arc<dyn LlmProvider>, options: GenerationOptions) -> Self {
        Self {
            provider,
            options,
            call_timeout: Duration::from_secs(60),
            backoff: BackoffConfig::default(),
        }
    }

    #[must_use]
    pub const fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    /// Default generation options
    pub const fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Underlying provider
    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    /// Send a single prompt and return the trimmed reply text
    pub async fn invoke(&self, prompt: &str) -> Result<String> {
        let messages = [Message::user(prompt)];
        let completion = self.complete(&messages, &self.options).await?;
        Ok(completion.content.trim().to_string())
    }

    /// Conversational completion with timeout and retry
    pub async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let mut failures = 0;

        loop {
            let attempt = tokio::time::timeout(
                self.call_timeout,
                self.provider.complete(messages, options),
            )
            .await
            .unwrap_or_else(|_| {
                Err(AgentError::Timeout(format!(
                    "model call exceeded {}s",
                    self.call_timeout.as_secs_f64()
                )))
            });

            match attempt {
                Ok(completion) => return Ok(completion),
                Err(e) if e.is_retryable() && failures + 1 < self.backoff.max_attempts => {
                    failures += 1;
                    let delay = self.backoff.delay_for(failures);
                    tracing::warn!(
                        error = %e,
                        attempt = failures,
                        delay_ms = delay.as_millis(),
                        "Model call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ModelInfo, ProviderInfo};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Fails with the queued errors, then echoes the last user message
    struct FlakyProvider {
        failures: Mutex<Vec<AgentError>>,
        calls: Mutex<u32>,
        delay: Duration,
    }

    impl FlakyProvider {
        fn new(failures: Vec<AgentError>) -> Self {
            Self {
                failures: Mutex::new(failures),
                calls: Mutex::new(0),
                delay: Duration::ZERO,
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl LlmProvider for FlakyProvider {
        async fn info(&self) -> Result<ProviderInfo> {
            Ok(ProviderInfo {
                name: "flaky".into(),
                models: vec![],
                supports_tools: false,
            })
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        async fn complete(
            &self,
            messages: &[Message],
            _options: &GenerationOptions,
        ) -> Result<Completion> {
            *self.calls.lock().unwrap() += 1;
            tokio::time::sleep(self.delay).await;
            let next = self.failures.lock().unwrap().pop();
            match next {
                Some(err) => Err(err),
                None => Ok(Completion::text(
                    format!("  {}  ", messages.last().map_or("", |m| m.content.as_str())),
                    "flaky",
                )),
            }
        }

        async fn list_models(&self) -> Result<Vec<ModelInfo>> {
            Ok(vec![])
        }
    }

    fn fast_backoff(max_attempts: u32) -> BackoffConfig {
        BackoffConfig {
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            multiplier: 2.0,
            max_attempts,
        }
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let backoff = BackoffConfig {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
            max_attempts: 5,
        };
        assert_eq!(backoff.delay_for(1), Duration::from_secs(1));
        assert_eq!(backoff.delay_for(2), Duration::from_secs(2));
        assert_eq!(backoff.delay_for(3), Duration::from_secs(4));
        assert_eq!(backoff.delay_for(4), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_invoke_trims_reply() {
        let provider = Arc::new(FlakyProvider::new(vec![]));
        let gateway = ModelGateway::new(provider, GenerationOptions::default());
        assert_eq!(gateway.invoke("ping").await.unwrap(), "ping");
    }

    #[tokio::test]
    async fn test_retries_transient_errors() {
        let provider = Arc::new(FlakyProvider::new(vec![
            AgentError::RateLimited("429".into()),
            AgentError::ProviderUnavailable("503".into()),
        ]));
        let gateway = ModelGateway::new(provider.clone(), GenerationOptions::default())
            .with_backoff(fast_backoff(3));

        assert_eq!(gateway.invoke("ping").await.unwrap(), "ping");
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let provider = Arc::new(FlakyProvider::new(vec![
            AgentError::RateLimited("3".into()),
            AgentError::RateLimited("2".into()),
            AgentError::RateLimited("1".into()),
        ]));
        let gateway = ModelGateway::new(provider.clone(), GenerationOptions::default())
            .with_backoff(fast_backoff(2));

        let err = gateway.invoke("ping").await.unwrap_err();
        assert!(matches!(err, AgentError::RateLimited(_)));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_non_retryable_error_is_fatal() {
        let provider = Arc::new(FlakyProvider::new(vec![AgentError::Auth("bad key".into())]));
        let gateway = ModelGateway::new(provider.clone(), GenerationOptions::default())
            .with_backoff(fast_backoff(5));

        assert!(matches!(
            gateway.invoke("ping").await,
            Err(AgentError::Auth(_))
        ));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_call_timeout() {
        let mut slow = FlakyProvider::new(vec![]);
        slow.delay = Duration::from_millis(200);
        let gateway = ModelGateway::new(Arc::new(slow), GenerationOptions::default())
            .with_call_timeout(Duration::from_millis(10))
            .with_backoff(BackoffConfig::none());

        assert!(matches!(
            gateway.invoke("ping").await,
            Err(AgentError::Timeout(_))
        ));
    }
}
