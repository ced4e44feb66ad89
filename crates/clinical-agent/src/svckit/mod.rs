//! Service Kit - Agent Tools
//!
//! Clinical tools implementing `agent_core::Tool`. Data tools talk to the
//! record store, messaging provider and report sink; decision tools wrap a
//! fixed prompt around a `ModelGateway` call.

mod diagnose;
mod fetch_history;
mod notify_patient;
mod report_diagnosis;

pub use diagnose::{DiagnoseTool, parse_confidence};
pub use fetch_history::FetchHistoryTool;
pub use notify_patient::NotifyPatientTool;
pub use order_test::OrderTestTool;
pub use recommend_test::RecommendTestTool;
pub use report_diagnosis::ReportDiagnosisTool;

/// Tool names as the model sees them
pub mod names {
    pub const FETCH_HISTORY: &str = "fetch_history";
    pub const DIAGNOSE: &str = "diagnose";
    pub const RECOMMEND_TEST: &str = "recommend_test";
    pub const ORDER_TEST: &str = "order_test";
    pub const NOTIFY_PATIENT: &str = "notify_patient";
    pub const REPORT_DIAGNOSIS: &str = "report_diagnosis";
}
