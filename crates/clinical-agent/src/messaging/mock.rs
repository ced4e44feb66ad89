//! Recording Messenger
//!
//! Keeps every message in memory instead of sending it.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::Messenger;
use crate::error::{ClinicalError, Result};
use crate::model::NotificationReceipt;

pub struct RecordingMessenger {
    to: String,
    sent: RwLock<Vec<String>>,
    fail: bool,
}

impl RecordingMessenger {
    pub fn new(to: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            sent: RwLock::new(Vec::new()),
            fail: false,
        }
    }

    /// A messenger whose every send is rejected
    pub fn failing(to: impl Into<String>) -> Self {
        Self {
            fail: true,
            ..Self::new(to)
        }
    }

    pub async fn sent(&self) -> Vec<String> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(&self, body: &str) -> Result<NotificationReceipt> {
        if self.fail {
            return Err(ClinicalError::NotificationFailed("provider rejected message".into()));
        }
        let mut sent = self.sent.write().await;
        sent.push(body.to_string());
        Ok(NotificationReceipt {
            sid: format!("SM{:032}", sent.len()),
            to: self.to.clone(),
            sent_at: chrono::Utc::now(),
        })
    }

    fn recipient(&self) -> &str {
        &self.to
    }
}
