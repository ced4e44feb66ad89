//! Twilio Messages API client
//!
//! `POST {api_base}/2010-04-01/Accounts/{sid}/Messages.json` with basic auth
//! and form fields `From`, `To`, `Body`. With a channel such as `whatsapp`,
//! addresses are sent as `whatsapp:+<number>`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::Messenger;
use crate::error::{ClinicalError, Result};
use crate::model::NotificationReceipt;

pub const DEFAULT_API_BASE: &str = "https://api.twilio.com";

#[derive(Clone, Debug)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender number; a leading `+` is optional
    pub from: String,
    /// Patient number; a leading `+` is optional
    pub to: String,
    /// Address prefix, e.g. `whatsapp`; `None` sends plain SMS
    pub channel: Option<String>,
    pub api_base: String,
    pub timeout: Duration,
}

impl TwilioConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("TWILIO_ACCOUNT_SID", &self.account_sid),
            ("TWILIO_AUTH_TOKEN", &self.auth_token),
            ("MESSAGE_FROM", &self.from),
            ("MESSAGE_TO", &self.to),
        ] {
            if value.trim().is_empty() {
                return Err(ClinicalError::Config(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }

    fn address(&self, number: &str) -> String {
        let number = number.trim().trim_start_matches('+');
        match self.channel.as_deref().map(str::trim) {
            Some(channel) if !channel.is_empty() => format!("{channel}:+{number}"),
            _ => format!("+{number}"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: String,
}

pub struct TwilioMessenger {
    http: reqwest::Client,
    config: TwilioConfig,
    to: String,
}

impl TwilioMessenger {
    pub fn new(config: TwilioConfig) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        let to = config.to.trim().trim_start_matches('+').to_string();
        Ok(Self { http, config, to })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.api_base.trim_end_matches('/'),
            self.config.account_sid
        )
    }
}

#[async_trait]
impl Messenger for TwilioMessenger {
    async fn send(&self, body: &str) -> Result<NotificationReceipt> {
        let form = [
            ("From", self.config.address(&self.config.from)),
            ("To", self.config.address(&self.config.to)),
            ("Body", body.to_string()),
        ];

        let response = self
            .http
            .post(self.endpoint())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| ClinicalError::NotificationFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ClinicalError::NotificationFailed(format!("HTTP {status}: {detail}")));
        }

        let message: MessageResource = response
            .json()
            .await
            .map_err(|e| ClinicalError::NotificationFailed(format!("malformed response: {e}")))?;

        tracing::info!(sid = %message.sid, "Notification sent");
        Ok(NotificationReceipt {
            sid: message.sid,
            to: self.to.clone(),
            sent_at: chrono::Utc::now(),
        })
    }

    fn recipient(&self) -> &str {
        &self.to
    }
}
