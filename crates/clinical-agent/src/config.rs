//! Configuration
//!
//! Everything the workflow needs is read once at startup and validated before
//! the first run. Legacy variable names are accepted as aliases.

use std::time::Duration;

use agent_core::{BackoffConfig, RunLimits};

use crate::error::{ClinicalError, Result};
use crate::messaging::{DEFAULT_API_BASE, TwilioConfig};
use crate::records::RecordStoreConfig;

/// Bounds on runs and on every model call inside them
#[derive(Clone, Debug)]
pub struct WorkflowLimits {
    pub max_turns: usize,
    pub run_deadline: Duration,
    pub model_call_timeout: Duration,
    pub model_max_attempts: u32,
}

impl Default for WorkflowLimits {
    fn default() -> Self {
        let run = RunLimits::default();
        Self {
            max_turns: run.max_turns,
            run_deadline: run.deadline,
            model_call_timeout: Duration::from_secs(60),
            model_max_attempts: BackoffConfig::default().max_attempts,
        }
    }
}

impl WorkflowLimits {
    pub fn validate(&self) -> Result<()> {
        if self.max_turns == 0 {
            return Err(ClinicalError::Config("AGENT_MAX_TURNS must be at least 1".into()));
        }
        if self.run_deadline.is_zero() || self.model_call_timeout.is_zero() {
            return Err(ClinicalError::Config("timeouts must be positive".into()));
        }
        if self.model_max_attempts == 0 {
            return Err(ClinicalError::Config("MODEL_MAX_ATTEMPTS must be at least 1".into()));
        }
        Ok(())
    }

    pub fn backoff(&self) -> BackoffConfig {
        BackoffConfig {
            max_attempts: self.model_max_attempts,
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClinicalConfig {
    pub records: RecordStoreConfig,
    pub messaging: TwilioConfig,
    pub limits: WorkflowLimits,
}

impl ClinicalConfig {
    /// Load from process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env = Env(&lookup);

        let http_timeout = Duration::from_secs(env.parse_or("HTTP_TIMEOUT_SECS", 30)?);

        let records = RecordStoreConfig {
            records_url: env.required(&["RECORDS_URL"])?,
            orders_url: env.required(&["ORDERS_URL"])?,
            api_key: env.required(&["RECORDS_API_KEY"])?,
            timeout: http_timeout,
        };

        let messaging = TwilioConfig {
            account_sid: env.required(&["TWILIO_ACCOUNT_SID", "ACCOUNT_SID"])?,
            auth_token: env.required(&["TWILIO_AUTH_TOKEN", "AUTH_TOKEN"])?,
            from: env.required(&["MESSAGE_FROM", "WHATSAPP_FROM"])?,
            to: env.required(&["MESSAGE_TO", "WHATSAPP_TO"])?,
            channel: match env.any(&["MESSAGE_CHANNEL"]) {
                Some(channel) if channel.eq_ignore_ascii_case("sms") => None,
                Some(channel) => Some(channel),
                None => Some("whatsapp".into()),
            },
            api_base: env
                .any(&["TWILIO_API_BASE"])
                .unwrap_or_else(|| DEFAULT_API_BASE.into()),
            timeout: http_timeout,
        };

        let defaults = WorkflowLimits::default();
        let limits = WorkflowLimits {
            max_turns: env.parse_or("AGENT_MAX_TURNS", defaults.max_turns)?,
            run_deadline: Duration::from_secs(
                env.parse_or("AGENT_RUN_TIMEOUT_SECS", defaults.run_deadline.as_secs())?,
            ),
            model_call_timeout: Duration::from_secs(
                env.parse_or("MODEL_CALL_TIMEOUT_SECS", defaults.model_call_timeout.as_secs())?,
            ),
            model_max_attempts: env.parse_or("MODEL_MAX_ATTEMPTS", defaults.model_max_attempts)?,
        };

        let config = Self {
            records,
            messaging,
            limits,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.records.validate()?;
        self.messaging.validate()?;
        self.limits.validate()
    }
}

struct Env<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    /// First non-blank value among `keys`
    fn any(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|k| (self.0)(k))
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
    }

    fn required(&self, keys: &[&str]) -> Result<String> {
        self.any(keys)
            .ok_or_else(|| ClinicalError::Config(format!("{} is not set", keys.join(" / "))))
    }

    fn parse_or<T: std::str::FromStr>(&self, key: &str, default: T) -> Result<T> {
        self.any(&[key]).map_or(Ok(default), |raw| {
            raw.parse()
                .map_err(|_| ClinicalError::Config(format!("{key} has invalid value {raw:?}")))
        })
    }
}
