//! Pricing decision and persisted pricing state.

use crate::decimal::Price;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction of a pricing move.
///
/// Always reconciled with the arithmetic sign of `new - previous`
/// before being persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Increase,
    Decrease,
    #[default]
    Hold,
}

impl Decision {
    /// Label matching the sign of `new - previous`.
    pub fn from_move(previous: Price, new: Price) -> Self {
        match new.cmp(&previous) {
            std::cmp::Ordering::Greater => Self::Increase,
            std::cmp::Ordering::Less => Self::Decrease,
            std::cmp::Ordering::Equal => Self::Hold,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increase => "increase",
            Self::Decrease => "decrease",
            Self::Hold => "hold",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "increase" => Ok(Self::Increase),
            "decrease" => Ok(Self::Decrease),
            "hold" => Ok(Self::Hold),
            other => Err(format!("unknown decision: {other}")),
        }
    }
}

/// Singleton pricing record.
///
/// Written as a single unit by the decision engine; `base <= current <= max`
/// holds after every successful update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingState {
    pub current_price: Price,
    /// Unix millis of the last committed decision, 0 if none.
    pub last_pricing_timestamp: i64,
    pub last_decision: Decision,
    pub last_reason: String,
}

impl PricingState {
    /// Fresh state at a given price with no decision history.
    pub fn initial(price: Price) -> Self {
        Self {
            current_price: price,
            last_pricing_timestamp: 0,
            last_decision: Decision::Hold,
            last_reason: String::new(),
        }
    }
}
