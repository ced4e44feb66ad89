//! # clinical-agent
//!
//! Clinical workflow agent: given a patient id, it reads the patient's
//! history, asks the model for an interpretation, optionally orders one more
//! test and always closes by notifying the patient.
//!
//! ## Flow
//!
//! ```text
//!  patient id ──► preamble ──► Agent ◄──────────────┐
//!                                │                  │
//!                       ┌────────┴─────────┐        │
//!                       ▼                  ▼        │
//!                 data tools         decision tools │
//!              fetch_history            diagnose    │
//!              order_test ──┐        recommend_test │
//!              notify_patient◄┘ (owed)              │
//!              report_diagnosis                     │
//!                       └──────── results ──────────┘
//!
//!  End: notify_patient succeeded in the last 3 messages
//!       and no order is waiting for its notification
//! ```
//!
//! Nothing clinical is validated: the model's output is advice routed
//! through a closed toolset, not a diagnosis.

pub mod config;
pub mod error;
pub mod messaging;
pub mod model;
pub mod prompts;
pub mod records;
pub mod report;
pub mod svckit;
pub mod workflow;

pub use config::{ClinicalConfig, WorkflowLimits};
pub use error::{ClinicalError, Result};
pub use model::{
    Confidence, ConfidenceSource, DiagnosisAssessment, NotificationReceipt, OrderConfirmation,
    PatientId, TestRecommendation, TestRecord,
};
pub use workflow::{ClinicalServices, ClinicalWorkflow, PatientRun};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{
        DiagnoseTool, FetchHistoryTool, NotifyPatientTool, OrderTestTool, RecommendTestTool,
        ReportDiagnosisTool, names,
    };
}
