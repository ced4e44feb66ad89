//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM provider error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Backend unreachable or 5xx
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// An outbound call exceeded its time budget
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Model asked for a tool outside the registry
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Arguments did not match the schema
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    /// Tool execution failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// The run exhausted its turn ceiling or wall-clock deadline
    #[error("Run stalled after {turns} turns: {reason}")]
    Stalled { turns: usize, reason: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rate limited
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Bad JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AgentError {
    /// Transient failures the gateway retries
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable(_) | Self::RateLimited(_) | Self::Timeout(_)
        )
    }

    /// Whether the run ended because it hit a bound rather than a failure
    pub const fn is_stalled(&self) -> bool {
        matches!(self, Self::Stalled { .. })
    }

    /// Text safe to return to API callers
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(msg) => format!("The AI service encountered an error: {msg}"),
            Self::ProviderUnavailable(_) => {
                "The AI service is currently unavailable. Please try again.".into()
            }
            Self::Timeout(what) => format!("A request timed out: {what}"),
            Self::ToolNotFound(name) => format!("The tool '{name}' is not available."),
            Self::ToolValidation(msg) => format!("Invalid tool input: {msg}"),
            Self::ToolExecution(msg) => format!("Tool error: {msg}"),
            Self::Stalled { turns, .. } => format!(
                "The agent did not reach a conclusion after {turns} turns and was stopped."
            ),
            Self::RateLimited(_) => "The AI service is rate limiting requests. Please wait a moment.".into(),
            Self::Auth(_) => "Authentication failed. Please check your credentials.".into(),
            Self::Config(msg) => format!("The service is misconfigured: {msg}"),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(AgentError::Timeout("model".into()).is_retryable());
        assert!(AgentError::RateLimited("429".into()).is_retryable());
        assert!(!AgentError::Provider("bad request".into()).is_retryable());
        assert!(
            !AgentError::Stalled {
                turns: 3,
                reason: "turn ceiling".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_stalled_user_message_mentions_turns() {
        let err = AgentError::Stalled {
            turns: 7,
            reason: "turn ceiling reached".into(),
        };
        assert!(err.is_stalled());
        assert!(err.user_message().contains('7'));
    }
}
