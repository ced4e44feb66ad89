//! Patient Messaging
//!
//! Outbound notifications to the patient's configured number.

mod mock;
mod twilio;

pub use mock::RecordingMessenger;
pub use twilio::{DEFAULT_API_BASE, TwilioConfig, TwilioMessenger};

use async_trait::async_trait;

use crate::error::Result;
use crate::model::NotificationReceipt;

/// Messaging provider (Strategy pattern)
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send `body` to the configured recipient
    async fn send(&self, body: &str) -> Result<NotificationReceipt>;

    /// Recipient number, digits only
    fn recipient(&self) -> &str;
}
