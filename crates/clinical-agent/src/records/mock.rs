//! In-memory Record Store
//!
//! For tests and offline demos. Orders are appended, never deduplicated.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::RecordStore;
use crate::error::{ClinicalError, Result};
use crate::model::{OrderConfirmation, PatientId, TestRecord};

#[derive(Default)]
pub struct InMemoryRecordStore {
    histories: RwLock<HashMap<String, Vec<TestRecord>>>,
    orders: RwLock<Vec<OrderConfirmation>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a patient's history
    #[must_use]
    pub fn with_history(mut self, patient_id: &str, records: Vec<TestRecord>) -> Self {
        self.histories
            .get_mut()
            .insert(patient_id.to_string(), records);
        self
    }

    /// Orders placed so far, in order
    pub async fn orders(&self) -> Vec<OrderConfirmation> {
        self.orders.read().await.clone()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn fetch_history(&self, patient_id: &PatientId) -> Result<Vec<TestRecord>> {
        self.histories
            .read()
            .await
            .get(patient_id.as_str())
            .cloned()
            .ok_or_else(|| ClinicalError::RetrievalFailed {
                patient_id: patient_id.to_string(),
                reason: "unknown patient".into(),
            })
    }

    async fn create_order(&self, patient_id: &PatientId, test: &str) -> Result<OrderConfirmation> {
        let mut orders = self.orders.write().await;
        let confirmation = OrderConfirmation {
            order_id: Some(format!("order-{}", orders.len() + 1)),
            patient_id: patient_id.to_string(),
            test: test.to_string(),
        };
        orders.push(confirmation.clone());
        Ok(confirmation)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_history_and_unknown_patient() {
        let store = InMemoryRecordStore::new().with_history("p-1", vec![TestRecord::new("CBC", "normal")]);

        let history = store.fetch_history(&PatientId::parse("p-1").unwrap()).await.unwrap();
        assert_eq!(history.len(), 1);

        let missing = store.fetch_history(&PatientId::parse("p-2").unwrap()).await;
        assert!(matches!(missing, Err(ClinicalError::RetrievalFailed { .. })));
    }

    #[tokio::test]
    async fn test_orders_are_not_deduplicated() {
        let store = InMemoryRecordStore::new();
        let id = PatientId::parse("p-1").unwrap();

        store.create_order(&id, "Lipase").await.unwrap();
        store.create_order(&id, "Lipase").await.unwrap();

        let orders = store.orders().await;
        assert_eq!(orders.len(), 2);
        assert_ne!(orders[0].order_id, orders[1].order_id);
    }
}
