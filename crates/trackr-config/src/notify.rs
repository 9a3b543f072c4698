//! Notification dispatcher configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Simultaneous in-flight deliveries.
const fn default_workers() -> usize {
    10
}

/// Delivery attempts per job, including the first one.
const fn default_max_attempts() -> u32 {
    5
}

const fn default_base_delay_ms() -> u64 {
    2_000
}

const fn default_max_delay_ms() -> u64 {
    60_000
}

fn default_from_address() -> String {
    "trackr@localhost".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotifyConfig {
    /// Upper bound on concurrent deliveries.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Attempt ceiling before a job is marked failed.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry; doubles on each further retry.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Cap on the backoff delay.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Sender address handed to the mail transport.
    #[serde(default = "default_from_address")]
    pub from_address: String,
}

impl NotifyConfig {
    #[must_use]
    pub const fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    #[must_use]
    pub const fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            from_address: default_from_address(),
        }
    }
}
