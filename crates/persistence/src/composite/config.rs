//! Configuration types for composite storage.
//!
//! The configuration decides how writes to the primary store are mirrored
//! into the search index:
//!
//! - whether index writes happen inline or on a background worker
//! - how long callers may wait for the index (the consistency window)
//! - how failed index writes are retried
//!
//! Durations are written in humantime form (`"50ms"`, `"5s"`) when the
//! configuration is loaded from a file.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tasks_persistence::composite::{SyncConfig, SyncMode};
//!
//! let config = SyncConfig::default()
//!     .with_mode(SyncMode::Synchronous)
//!     .with_consistency_window(Duration::from_secs(2));
//!
//! assert_eq!(config.retry.max_retries, 5);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Synchronization mode for the search index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Update the index before the write returns.
    /// Higher latency, search is consistent as soon as the call completes.
    Synchronous,

    /// Update the index from a background worker.
    /// Lower latency, search converges within the consistency window.
    #[default]
    Asynchronous,
}

impl std::str::FromStr for SyncMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sync" | "synchronous" => Ok(SyncMode::Synchronous),
            "async" | "asynchronous" => Ok(SyncMode::Asynchronous),
            other => Err(format!(
                "invalid sync mode '{}', expected 'sync' or 'async'",
                other
            )),
        }
    }
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncMode::Synchronous => write!(f, "sync"),
            SyncMode::Asynchronous => write!(f, "async"),
        }
    }
}

/// Retry configuration for index writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry.
    #[serde(with = "humantime_serde", default = "default_initial_delay")]
    pub initial_delay: Duration,

    /// Upper bound for any single delay.
    #[serde(with = "humantime_serde", default = "default_max_delay")]
    pub max_delay: Duration,

    /// Backoff multiplier.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

fn default_max_retries() -> u32 {
    5
}

fn default_initial_delay() -> Duration {
    Duration::from_millis(50)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `retry` (1-based), capped at `max_delay`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31) as i32;
        let factor = self.backoff_multiplier.max(1.0).powi(exponent);
        let millis = (self.initial_delay.as_millis() as f64 * factor)
            .min(self.max_delay.as_millis() as f64);
        Duration::from_millis(millis as u64)
    }
}

/// Synchronization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Inline or background index writes.
    #[serde(default)]
    pub mode: SyncMode,

    /// Longest time an index write may lag behind the primary write.
    /// Also bounds how long a write waits to enqueue its index event.
    #[serde(with = "humantime_serde", default = "default_consistency_window")]
    pub consistency_window: Duration,

    /// Capacity of the background queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Maximum events the worker takes per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// How long the worker waits to fill a batch.
    #[serde(with = "humantime_serde", default = "default_batch_timeout")]
    pub batch_timeout: Duration,

    /// How often parked ids are retried.
    #[serde(with = "humantime_serde", default = "default_reconcile_interval")]
    pub reconcile_interval: Duration,

    /// Retry configuration for failed index writes.
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_consistency_window() -> Duration {
    Duration::from_secs(5)
}

fn default_queue_capacity() -> usize {
    1000
}

fn default_batch_size() -> usize {
    100
}

fn default_batch_timeout() -> Duration {
    Duration::from_millis(20)
}

fn default_reconcile_interval() -> Duration {
    Duration::from_secs(1)
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            mode: SyncMode::default(),
            consistency_window: default_consistency_window(),
            queue_capacity: default_queue_capacity(),
            batch_size: default_batch_size(),
            batch_timeout: default_batch_timeout(),
            reconcile_interval: default_reconcile_interval(),
            retry: RetryConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Sets the sync mode.
    pub fn with_mode(mut self, mode: SyncMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the consistency window.
    pub fn with_consistency_window(mut self, window: Duration) -> Self {
        self.consistency_window = window;
        self
    }

    /// Sets the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the interval between retries of parked ids.
    pub fn with_reconcile_interval(mut self, interval: Duration) -> Self {
        self.reconcile_interval = interval;
        self
    }

    /// Sets the queue capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }
}

/// Serde module for Duration with humantime format.
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
