//! Run Reports
//!
//! Identity and outcome of one orchestrator run. Runs are never persisted;
//! the report is what the caller keeps after the conversation is dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AgentError;
use crate::tool::{ToolCall, ToolResult};

/// Unique run identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Terminal status of a run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Reached `End` through the completion policy
    Completed,
    /// Hit the turn ceiling or the wall-clock deadline
    Stalled,
    /// A fatal error (model failure, misconfiguration) ended the run
    Failed,
}

impl RunStatus {
    pub const fn from_error(err: &AgentError) -> Self {
        if err.is_stalled() {
            Self::Stalled
        } else {
            Self::Failed
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Stalled => write!(f, "stalled"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// One executed tool call and its result
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Invocation {
    /// Turn in which the model requested the call
    pub turn: usize,
    pub call: ToolCall,
    pub result: ToolResult,
}

/// Outcome of a completed run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub status: RunStatus,

    /// Model decisions taken
    pub turns: usize,

    /// Every tool call executed, in order
    pub invocations: Vec<Invocation>,

    /// Last plain-text response from the model
    pub final_response: String,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    /// Number of executed calls to the named tool
    pub fn calls_to(&self, tool: &str) -> usize {
        self.invocations.iter().filter(|i| i.call.name == tool).count()
    }

    /// Number of successful calls to the named tool
    pub fn successes_of(&self, tool: &str) -> usize {
        self.invocations
            .iter()
            .filter(|i| i.call.name == tool && i.result.success)
            .count()
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_error() {
        let stalled = AgentError::Stalled {
            turns: 4,
            reason: "deadline".into(),
        };
        assert_eq!(RunStatus::from_error(&stalled), RunStatus::Stalled);
        assert_eq!(
            RunStatus::from_error(&AgentError::Provider("boom".into())),
            RunStatus::Failed
        );
        assert_eq!(RunStatus::Completed.to_string(), "completed");
    }

    #[test]
    fn test_report_counts() {
        let now = Utc::now();
        let report = RunReport {
            run_id: RunId::new(),
            status: RunStatus::Completed,
            turns: 3,
            invocations: vec![
                Invocation {
                    turn: 1,
                    call: ToolCall::new("order_test"),
                    result: ToolResult::success("order_test", "Ordered CBC"),
                },
                Invocation {
                    turn: 2,
                    call: ToolCall::new("order_test"),
                    result: ToolResult::failure("order_test", "Error"),
                },
            ],
            final_response: "done".into(),
            started_at: now,
            finished_at: now,
        };
        assert_eq!(report.calls_to("order_test"), 2);
        assert_eq!(report.successes_of("order_test"), 1);
        assert_eq!(report.calls_to("notify_patient"), 0);
    }
}
