//! Application State

use std::sync::Arc;

use agent_core::LlmProvider;
use clinical_agent::ClinicalWorkflow;

/// Shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// Orchestrator shared by all requests; runs never share a conversation
    pub workflow: Arc<ClinicalWorkflow>,

    /// LLM provider, for health reporting
    pub provider: Arc<dyn LlmProvider>,
}
