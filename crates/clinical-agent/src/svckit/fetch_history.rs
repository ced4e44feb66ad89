//! Patient History Tool

use std::sync::Arc;

use agent_core::{ParameterSchema, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema};
use async_trait::async_trait;

use super::names::FETCH_HISTORY;
use crate::model::{PatientId, format_history};
use crate::records::RecordStore;

pub struct FetchHistoryTool {
    store: Arc<dyn RecordStore>,
}

impl FetchHistoryTool {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Text returned to the model whenever retrieval fails
    pub fn failure_text(patient_id: &str) -> String {
        format!(
            "Error: Failed to retrieve results for patient {patient_id}. \
             Either patient_id is wrong or there is no historical data."
        )
    }
}

#[async_trait]
impl Tool for FetchHistoryTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: FETCH_HISTORY.into(),
            description: "Returns the patient's recorded test results, one `test : result` line per record.".into(),
            parameters: vec![ParameterSchema::required_string(
                "patient_id",
                "The patient's id",
            )],
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let raw_id = call.require_str("patient_id")?;
        let patient_id = PatientId::parse(raw_id)?;

        match self.store.fetch_history(&patient_id).await {
            Ok(records) if records.is_empty() => Ok(ToolResult::success(
                FETCH_HISTORY,
                format!("No records on file for patient {patient_id}."),
            )),
            Ok(records) => Ok(ToolResult::success(FETCH_HISTORY, format_history(&records))
                .with_data(serde_json::json!({ "records": records.len() }))),
            Err(e) => {
                tracing::warn!(patient_id = %patient_id, store = self.store.name(), error = %e, "History retrieval failed");
                Ok(ToolResult::failure(
                    FETCH_HISTORY,
                    Self::failure_text(patient_id.as_str()),
                ))
            }
        }
    }
}
