//! Record Store Integration
//!
//! Patient history lookups and test orders against the clinical database.

mod http;
mod mock;

pub use http::{HttpRecordStore, RecordStoreConfig};
pub use mock::InMemoryRecordStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{OrderConfirmation, PatientId, TestRecord};

/// Record store client
///
/// Failures are typed here; the tools turn them into sentinel text.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All recorded test results for a patient
    async fn fetch_history(&self, patient_id: &PatientId) -> Result<Vec<TestRecord>>;

    /// Create a new order. Not idempotent: every call creates an order.
    async fn create_order(&self, patient_id: &PatientId, test: &str) -> Result<OrderConfirmation>;

    /// Backend name for logs
    fn name(&self) -> &str;
}
