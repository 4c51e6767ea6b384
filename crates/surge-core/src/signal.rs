//! Market signal types.

use crate::error::{CoreError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of market observation.
///
/// Each type keeps its own last-observed value and significance threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    DemandSurge,
    CompetitorPrice,
    StockDrop,
    StockIncrease,
}

impl SignalType {
    /// All signal types, in evaluation order.
    pub const ALL: [SignalType; 4] = [
        SignalType::DemandSurge,
        SignalType::CompetitorPrice,
        SignalType::StockDrop,
        SignalType::StockIncrease,
    ];

    /// Stable wire/storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DemandSurge => "demand_surge",
            Self::CompetitorPrice => "competitor_price",
            Self::StockDrop => "stock_drop",
            Self::StockIncrease => "stock_increase",
        }
    }

    /// Dense index for per-type tables.
    pub fn index(&self) -> usize {
        match self {
            Self::DemandSurge => 0,
            Self::CompetitorPrice => 1,
            Self::StockDrop => 2,
            Self::StockIncrease => 3,
        }
    }

    /// Whether the signal value describes inventory on hand.
    pub fn is_stock(&self) -> bool {
        matches!(self, Self::StockDrop | Self::StockIncrease)
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        SignalType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::UnknownSignalType(s.to_string()))
    }
}

/// Origin of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalSource {
    /// Human-triggered injection.
    Manual,
    /// Produced by the periodic reconciler.
    Cron,
    /// Debug trigger, processed immediately.
    Debug,
}

impl SignalSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Cron => "cron",
            Self::Debug => "debug",
        }
    }

    /// Human-driven sources bypass the decision cooldown.
    pub fn is_operator(&self) -> bool {
        matches!(self, Self::Manual | Self::Debug)
    }
}

impl fmt::Display for SignalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed, timestamped market observation.
///
/// Immutable once constructed. Construction validates `value > 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSignal {
    /// Unique id for tracing a signal through the pipeline.
    #[serde(default = "new_signal_id")]
    pub signal_id: String,
    #[serde(rename = "type")]
    pub signal_type: SignalType,
    pub value: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub source: SignalSource,
}

fn new_signal_id() -> String {
    format!("sig_{}", uuid::Uuid::new_v4().simple())
}

impl MarketSignal {
    /// Create a validated signal.
    pub fn new(
        signal_type: SignalType,
        value: Decimal,
        source: SignalSource,
        timestamp: DateTime<Utc>,
    ) -> Result<Self> {
        let signal = Self {
            signal_id: new_signal_id(),
            signal_type,
            value,
            reason: None,
            timestamp,
            source,
        };
        signal.validate()?;
        Ok(signal)
    }

    /// Attach a human-readable reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Validate shape and value. Used for signals arriving deserialized.
    pub fn validate(&self) -> Result<()> {
        if self.value <= Decimal::ZERO {
            return Err(CoreError::InvalidSignal(format!(
                "{} value must be positive, got {}",
                self.signal_type, self.value
            )));
        }
        if self.signal_id.is_empty() {
            return Err(CoreError::InvalidSignal("empty signal_id".to_string()));
        }
        Ok(())
    }

    /// Age relative to `now`, in milliseconds (negative if from the future).
    pub fn age_ms(&self, now: DateTime<Utc>) -> i64 {
        (now - self.timestamp).num_milliseconds()
    }
}

/// One page-view telemetry event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawViewEvent {
    pub item_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl RawViewEvent {
    pub fn new(item_id: impl Into<String>, user_id: Option<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            item_id: item_id.into(),
            user_id,
            timestamp,
        }
    }

    /// Whether the event falls inside the trailing window ending at `now`.
    pub fn is_within(&self, now: DateTime<Utc>, window_ms: i64) -> bool {
        let age = (now - self.timestamp).num_milliseconds();
        (0..=window_ms).contains(&age)
    }
}
