use std::time::Duration;

use serde::Deserialize;

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
pub enum Strategy {
    /// Owner-token records created with an atomic "add if absent"
    #[default]
    #[serde(rename = "add")]
    Add,
    /// Expiry-timestamp records with stale-lock takeover
    #[serde(rename = "cas")]
    Cas,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Add => "add",
            Strategy::Cas => "cas",
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct LockConfig {
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default)]
    pub prefix: String,
    /// Lease duration of a lock record, in seconds
    #[serde(default = "LockConfig::default_timeout")]
    pub timeout: u64,
    /// Default acquisition budget, in seconds
    #[serde(default = "LockConfig::default_max_timeout")]
    pub max_timeout: u64,
    /// Pause between two acquisition attempts, in microseconds
    #[serde(default = "LockConfig::default_retry_wait")]
    pub retry_wait: u64,
}

impl LockConfig {
    fn default_timeout() -> u64 {
        30
    }

    fn default_max_timeout() -> u64 {
        300
    }

    fn default_retry_wait() -> u64 {
        100_000
    }

    /// The key under which the record for `key` is stored
    pub fn key(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{key}", self.prefix)
        }
    }

    pub fn acquire_budget(&self, acquire_timeout: Option<Duration>) -> Duration {
        acquire_timeout.unwrap_or(Duration::from_secs(self.max_timeout))
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_micros(self.retry_wait)
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            prefix: String::new(),
            timeout: Self::default_timeout(),
            max_timeout: Self::default_max_timeout(),
            retry_wait: Self::default_retry_wait(),
        }
    }
}
