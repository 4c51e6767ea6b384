//! Detector configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use surge_core::SignalType;

/// Per-type significance thresholds, as fractional change from the
/// last-seen value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Minimum relative change in view velocity.
    #[serde(default = "default_demand_threshold")]
    pub demand_threshold: Decimal,
    /// Minimum relative change in competitor price.
    #[serde(default = "default_competitor_threshold")]
    pub competitor_threshold: Decimal,
    /// Minimum relative change in stock, in the signal's direction.
    #[serde(default = "default_stock_threshold")]
    pub stock_threshold: Decimal,
    /// Manual signals younger than this are always significant.
    #[serde(default = "default_manual_freshness_ms")]
    pub manual_freshness_ms: i64,
}

fn default_demand_threshold() -> Decimal {
    Decimal::new(15, 2) // 0.15
}

fn default_competitor_threshold() -> Decimal {
    Decimal::new(5, 2) // 0.05
}

fn default_stock_threshold() -> Decimal {
    Decimal::new(20, 2) // 0.20
}

fn default_manual_freshness_ms() -> i64 {
    120_000
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            demand_threshold: default_demand_threshold(),
            competitor_threshold: default_competitor_threshold(),
            stock_threshold: default_stock_threshold(),
            manual_freshness_ms: default_manual_freshness_ms(),
        }
    }
}

impl DetectorConfig {
    /// Threshold for a given signal type.
    pub fn threshold(&self, signal_type: SignalType) -> Decimal {
        match signal_type {
            SignalType::DemandSurge => self.demand_threshold,
            SignalType::CompetitorPrice => self.competitor_threshold,
            SignalType::StockDrop | SignalType::StockIncrease => self.stock_threshold,
        }
    }

    /// Validate configuration values.
    ///
    /// Thresholds must be positive; freshness must be non-negative.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("demand_threshold", self.demand_threshold),
            ("competitor_threshold", self.competitor_threshold),
            ("stock_threshold", self.stock_threshold),
        ] {
            if value <= Decimal::ZERO {
                return Err(format!("{name} ({value}) must be positive"));
            }
        }

        if self.manual_freshness_ms < 0 {
            return Err(format!(
                "manual_freshness_ms ({}) must be non-negative",
                self.manual_freshness_ms
            ));
        }

        Ok(())
    }
}
