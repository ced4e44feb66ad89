//! Error Types for the Clinical Agent

use agent_core::AgentError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClinicalError>;

#[derive(Error, Debug)]
pub enum ClinicalError {
    #[error("Failed to retrieve results for patient {patient_id}: {reason}")]
    RetrievalFailed { patient_id: String, reason: String },

    #[error("Failed to order {test} for patient {patient_id}: {reason}")]
    OrderFailed {
        patient_id: String,
        test: String,
        reason: String,
    },

    #[error("Notification failed: {0}")]
    NotificationFailed(String),

    #[error("Invalid patient id: {0:?}")]
    InvalidPatientId(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

impl From<ClinicalError> for AgentError {
    fn from(err: ClinicalError) -> Self {
        match err {
            ClinicalError::Agent(inner) => inner,
            ClinicalError::Config(msg) => Self::Config(msg),
            ClinicalError::InvalidPatientId(_) => Self::ToolValidation(err.to_string()),
            ClinicalError::Network(e) if e.is_timeout() => Self::Timeout(e.to_string()),
            ClinicalError::Serialization(e) => Self::Json(e),
            other => Self::ToolExecution(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_into_agent_error() {
        let err: AgentError = ClinicalError::Config("RECORDS_URL is not set".into()).into();
        assert!(matches!(err, AgentError::Config(_)));

        let err: AgentError = ClinicalError::NotificationFailed("HTTP 401".into()).into();
        assert!(matches!(err, AgentError::ToolExecution(_)));
        assert!(err.to_string().contains("HTTP 401"));
    }
}
