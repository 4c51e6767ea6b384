//! Market context handed to an oracle.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use surge_core::{MarketSignal, Price, SignalSource, SignalType};

/// Coarse inventory classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    Low,
    Normal,
    High,
}

impl StockStatus {
    /// `level < low` is low, `level > high` is high, otherwise normal.
    pub fn classify(level: Decimal, low: Decimal, high: Decimal) -> Self {
        if level < low {
            Self::Low
        } else if level > high {
            Self::High
        } else {
            Self::Normal
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        };
        f.write_str(s)
    }
}

/// The signal being priced, as the oracle sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSummary {
    #[serde(rename = "type")]
    pub signal_type: SignalType,
    pub value: Decimal,
    pub source: SignalSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<&MarketSignal> for SignalSummary {
    fn from(signal: &MarketSignal) -> Self {
        Self {
            signal_type: signal.signal_type,
            value: signal.value,
            source: signal.source,
            reason: signal.reason.clone(),
        }
    }
}

/// Everything an oracle may base a price on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingContext {
    pub current_price: Price,
    /// Hard floor.
    pub base_price: Price,
    pub min_price: Price,
    pub max_price: Price,
    /// Maximum fractional move per update.
    pub max_change_pct: Decimal,
    /// Margin kept below a matched competitor price.
    pub min_margin_pct: Decimal,
    pub competitor_price: Price,
    /// `competitor - current`.
    pub competitor_delta: Decimal,
    /// `(competitor - current) / current * 100`.
    pub competitor_delta_pct: Decimal,
    pub stock_level: Decimal,
    pub stock_status: StockStatus,
    pub demand_level: Decimal,
    pub signal: SignalSummary,
}

impl PricingContext {
    /// Lowest price the engine will ever persist.
    pub fn floor(&self) -> Price {
        self.base_price.max(self.min_price)
    }

    /// Clamp into `[floor, max_price]`.
    pub fn clamp(&self, price: Price) -> Price {
        price.clamp(self.floor(), self.max_price)
    }
}
