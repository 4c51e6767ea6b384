//! Reconciler configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Tick cadence.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Trailing window of views counted as demand.
    #[serde(default = "default_window_ms")]
    pub window_ms: i64,
}

fn default_interval_ms() -> u64 {
    60_000
}

fn default_window_ms() -> i64 {
    60_000
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            window_ms: default_window_ms(),
        }
    }
}

impl ReconcilerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.interval_ms == 0 {
            return Err("interval_ms must be > 0".to_string());
        }
        if self.window_ms <= 0 {
            return Err(format!("window_ms ({}) must be positive", self.window_ms));
        }
        Ok(())
    }
}
