//! HTTP record store client
//!
//! `GET <records_url>?patient_id=<id>` for history, `POST <orders_url>` with
//! `{patient_id, test}` for orders. Both send the `apikey` header and the same
//! key as a bearer token.

use std::time::Duration;

use async_trait::async_trait;

use super::RecordStore;
use crate::error::{ClinicalError, Result};
use crate::model::{
    HistoryResponse, OrderConfirmation, OrderRequest, OrderResponse, PatientId, TestRecord,
};

#[derive(Clone, Debug)]
pub struct RecordStoreConfig {
    /// Patient history endpoint
    pub records_url: String,
    /// Order creation endpoint
    pub orders_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl RecordStoreConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("RECORDS_URL", &self.records_url),
            ("ORDERS_URL", &self.orders_url),
            ("RECORDS_API_KEY", &self.api_key),
        ] {
            if value.trim().is_empty() {
                return Err(ClinicalError::Config(format!("{name} must not be empty")));
            }
        }
        if self.timeout.is_zero() {
            return Err(ClinicalError::Config("HTTP timeout must be positive".into()));
        }
        Ok(())
    }
}

pub struct HttpRecordStore {
    http: reqwest::Client,
    config: RecordStoreConfig,
}

impl HttpRecordStore {
    pub fn new(config: RecordStoreConfig) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn fetch_history(&self, patient_id: &PatientId) -> Result<Vec<TestRecord>> {
        let failed = |reason: String| ClinicalError::RetrievalFailed {
            patient_id: patient_id.to_string(),
            reason,
        };

        let response = self
            .authorize(self.http.get(&self.config.records_url))
            .query(&[("patient_id", patient_id.as_str())])
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("HTTP {status}")));
        }

        let body: HistoryResponse = response
            .json()
            .await
            .map_err(|e| failed(format!("malformed response: {e}")))?;

        tracing::debug!(patient_id = %patient_id, records = body.data.len(), "History retrieved");
        Ok(body.data)
    }

    async fn create_order(&self, patient_id: &PatientId, test: &str) -> Result<OrderConfirmation> {
        let failed = |reason: String| ClinicalError::OrderFailed {
            patient_id: patient_id.to_string(),
            test: test.to_string(),
            reason,
        };

        let body = OrderRequest {
            patient_id: patient_id.to_string(),
            test: test.to_string(),
        };

        let response = self
            .authorize(self.http.post(&self.config.orders_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("HTTP {status}")));
        }

        // Some deployments answer 201 with an empty body
        let confirmation = match response.json::<OrderResponse>().await {
            Ok(parsed) => parsed.data,
            Err(e) => {
                tracing::debug!(error = %e, "Order response carried no confirmation body");
                OrderConfirmation {
                    order_id: None,
                    patient_id: body.patient_id,
                    test: body.test,
                }
            }
        };

        tracing::info!(
            patient_id = %patient_id,
            test = %test,
            order_id = ?confirmation.order_id,
            "Test ordered"
        );
        Ok(confirmation)
    }

    fn name(&self) -> &str {
        "http"
    }
}
