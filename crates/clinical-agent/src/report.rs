//! Diagnosis report sinks
//!
//! Where `report_diagnosis` writes. The default goes to the operator log.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;

#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn emit(&self, diagnosis: &str) -> Result<()>;
}

/// Emits reports through `tracing` at info level
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingReportSink;

#[async_trait]
impl ReportSink for TracingReportSink {
    async fn emit(&self, diagnosis: &str) -> Result<()> {
        tracing::info!(target: "clinical_agent::report", "=== DIAGNOSIS REPORT ===\n{diagnosis}");
        Ok(())
    }
}

/// Collects reports for inspection
#[derive(Debug, Default)]
pub struct MemoryReportSink {
    reports: RwLock<Vec<String>>,
}

impl MemoryReportSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn reports(&self) -> Vec<String> {
        self.reports.read().await.clone()
    }
}

#[async_trait]
impl ReportSink for MemoryReportSink {
    async fn emit(&self, diagnosis: &str) -> Result<()> {
        self.reports.write().await.push(diagnosis.to_string());
        Ok(())
    }
}
