//! Clinical Workflow
//!
//! Wires the six tools into an orchestrator whose completion policy encodes
//! the patient-contact rule: a run ends only after a successful
//! `notify_patient` in the last three messages, and every successful
//! `order_test` must be followed by a notification.

use std::sync::Arc;

use agent_core::{
    Agent, AgentBuilder, AgentError, Conversation, GenerationOptions, LlmProvider, ModelGateway,
    RunReport, RunStatus,
};

use crate::config::{ClinicalConfig, WorkflowLimits};
use crate::error::Result;
use crate::messaging::{Messenger, TwilioMessenger};
use crate::model::PatientId;
use crate::prompts::{CLINICAL_SYSTEM_PROMPT, patient_preamble};
use crate::records::{HttpRecordStore, RecordStore};
use crate::report::{ReportSink, TracingReportSink};
use crate::svckit::{
    DiagnoseTool, FetchHistoryTool, NotifyPatientTool, OrderTestTool, RecommendTestTool,
    ReportDiagnosisTool, names,
};

/// Messages searched for the terminal notification
pub const NOTIFICATION_LOOKBACK: usize = 3;

/// External collaborators of the data tools
#[derive(Clone)]
pub struct ClinicalServices {
    pub records: Arc<dyn RecordStore>,
    pub messenger: Arc<dyn Messenger>,
    pub reports: Arc<dyn ReportSink>,
}

impl ClinicalServices {
    /// HTTP record store, Twilio messenger and log-backed reports
    pub fn from_config(config: &ClinicalConfig) -> Result<Self> {
        Ok(Self {
            records: Arc::new(HttpRecordStore::new(config.records.clone())?),
            messenger: Arc::new(TwilioMessenger::new(config.messaging.clone())?),
            reports: Arc::new(TracingReportSink),
        })
    }
}

/// Outcome of one patient run; the transcript survives failures
#[derive(Debug)]
pub struct PatientRun {
    pub patient_id: PatientId,
    pub conversation: Conversation,
    pub outcome: std::result::Result<RunReport, AgentError>,
}

impl PatientRun {
    pub fn status(&self) -> RunStatus {
        match &self.outcome {
            Ok(report) => report.status,
            Err(e) => RunStatus::from_error(e),
        }
    }

    pub fn transcript(&self) -> String {
        self.conversation.transcript()
    }
}

/// One orchestrator shared by all runs; each run gets its own conversation
pub struct ClinicalWorkflow {
    agent: Agent,
}

impl ClinicalWorkflow {
    pub fn new(gateway: ModelGateway, services: ClinicalServices, limits: &WorkflowLimits) -> Result<Self> {
        limits.validate()?;

        let agent = AgentBuilder::new()
            .gateway(gateway.clone())
            .system_prompt(CLINICAL_SYSTEM_PROMPT)
            .tool(FetchHistoryTool::new(services.records.clone()))
            .tool(DiagnoseTool::new(gateway.clone()))
            .tool(RecommendTestTool::new(gateway))
            .tool(OrderTestTool::new(services.records))
            .tool(NotifyPatientTool::new(services.messenger))
            .tool(ReportDiagnosisTool::new(services.reports))
            .terminal_tool(names::NOTIFY_PATIENT, NOTIFICATION_LOOKBACK)
            .obligation(names::ORDER_TEST, names::NOTIFY_PATIENT)
            .max_turns(limits.max_turns)
            .deadline(limits.run_deadline)
            .build()?;

        Ok(Self { agent })
    }

    /// Build the gateway from `provider` with the configured call bounds
    pub fn with_provider(
        provider: Arc<dyn LlmProvider>,
        options: GenerationOptions,
        services: ClinicalServices,
        limits: &WorkflowLimits,
    ) -> Result<Self> {
        let gateway = ModelGateway::new(provider, options)
            .with_call_timeout(limits.model_call_timeout)
            .with_backoff(limits.backoff());
        Self::new(gateway, services, limits)
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Run the workflow for one patient
    pub async fn run(&self, patient_id: PatientId) -> PatientRun {
        tracing::info!(patient_id = %patient_id, "Starting patient run");

        let mut conversation = self.agent.start(patient_preamble(&patient_id));
        let outcome = self.agent.run(&mut conversation).await;

        match &outcome {
            Ok(report) => tracing::info!(
                patient_id = %patient_id,
                run_id = %report.run_id,
                turns = report.turns,
                orders = report.successes_of(names::ORDER_TEST),
                notifications = report.successes_of(names::NOTIFY_PATIENT),
                "Patient run completed"
            ),
            Err(e) => tracing::warn!(patient_id = %patient_id, error = %e, "Patient run did not complete"),
        }

        PatientRun {
            patient_id,
            conversation,
            outcome,
        }
    }
}
