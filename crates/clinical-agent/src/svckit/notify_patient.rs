//! Patient Notification Tool

use std::sync::Arc;

use agent_core::{ParameterSchema, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema};
use async_trait::async_trait;

use super::names::NOTIFY_PATIENT;
use crate::messaging::Messenger;

pub struct NotifyPatientTool {
    messenger: Arc<dyn Messenger>,
}

impl NotifyPatientTool {
    pub fn new(messenger: Arc<dyn Messenger>) -> Self {
        Self { messenger }
    }
}

#[async_trait]
impl Tool for NotifyPatientTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: NOTIFY_PATIENT.into(),
            description: "Sends a message to the patient about results, ordered tests or next steps.".into(),
            parameters: vec![ParameterSchema::required_string(
                "message",
                "Message text for the patient",
            )],
            has_side_effects: true,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let message = call.require_str("message")?;

        match self.messenger.send(message).await {
            Ok(receipt) => Ok(ToolResult::success(
                NOTIFY_PATIENT,
                format!(
                    "Notification successfully sent to patient at +{}. Message ID: {}",
                    receipt.to, receipt.sid
                ),
            )
            .with_data(serde_json::to_value(&receipt)?)),
            Err(e) => {
                tracing::warn!(recipient = %self.messenger.recipient(), error = %e, "Notification failed");
                Ok(ToolResult::failure(
                    NOTIFY_PATIENT,
                    format!(
                        "Error: Failed to notify patient at +{}.",
                        self.messenger.recipient()
                    ),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::RecordingMessenger;

    #[tokio::test]
    async fn test_notification_receipt_text() {
        let messenger = Arc::new(RecordingMessenger::new("15551234567"));
        let tool = NotifyPatientTool::new(messenger.clone());

        let result = tool
            .execute(&ToolCall::new(NOTIFY_PATIENT).arg("message", "Your CBC is normal."))
            .await
            .unwrap();

        assert!(result.success);
        assert!(result.output.starts_with("Notification successfully sent to patient at +15551234567. Message ID: SM"));
        assert_eq!(messenger.sent().await, vec!["Your CBC is normal."]);
    }

    #[tokio::test]
    async fn test_provider_failure_is_failed_result() {
        let tool = NotifyPatientTool::new(Arc::new(RecordingMessenger::failing("1555")));
        let result = tool
            .execute(&ToolCall::new(NOTIFY_PATIENT).arg("message", "hi"))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.starts_with("Error: Failed to notify patient"));
    }
}
