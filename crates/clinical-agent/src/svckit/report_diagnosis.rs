//! Diagnosis Report Tool

use std::sync::Arc;

use agent_core::{ParameterSchema, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema};
use async_trait::async_trait;

use super::names::REPORT_DIAGNOSIS;
use crate::report::ReportSink;

pub struct ReportDiagnosisTool {
    sink: Arc<dyn ReportSink>,
}

impl ReportDiagnosisTool {
    pub fn new(sink: Arc<dyn ReportSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl Tool for ReportDiagnosisTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: REPORT_DIAGNOSIS.into(),
            description: "Records the final diagnosis for clinical staff.".into(),
            parameters: vec![ParameterSchema::required_string(
                "diagnosis",
                "The final diagnosis",
            )],
            has_side_effects: true,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let diagnosis = call.require_str("diagnosis")?;
        self.sink.emit(diagnosis).await?;
        Ok(ToolResult::success(
            REPORT_DIAGNOSIS,
            format!("Diagnosis outputted: {diagnosis}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::MemoryReportSink;

    #[tokio::test]
    async fn test_report_is_emitted() {
        let sink = Arc::new(MemoryReportSink::new());
        let tool = ReportDiagnosisTool::new(sink.clone());

        let result = tool
            .execute(&ToolCall::new(REPORT_DIAGNOSIS).arg("diagnosis", "Acute pancreatitis"))
            .await
            .unwrap();

        assert_eq!(result.output, "Diagnosis outputted: Acute pancreatitis");
        assert_eq!(sink.reports().await, vec!["Acute pancreatitis"]);
    }
}
