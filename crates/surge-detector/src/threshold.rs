//! Per-type significance rules.

use crate::config::DetectorConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use surge_core::SignalType;

/// Why a signal was (or was not) judged significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignificanceReason {
    /// No prior value recorded for the type.
    Bootstrap,
    /// Prior value was zero; relative change is undefined.
    ZeroBaseline,
    /// Relative change cleared the type's threshold.
    ThresholdCleared,
    /// Relative change below the threshold.
    BelowThreshold,
    /// Stock moved opposite to the signal's direction.
    WrongDirection,
    /// Fresh manual signal, accepted regardless of threshold.
    ManualOverride,
}

/// Outcome of a threshold check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignificanceCheck {
    pub significant: bool,
    pub reason: SignificanceReason,
    /// `|new - last| / last`, when defined.
    pub pct_change: Option<Decimal>,
}

impl SignificanceCheck {
    fn new(significant: bool, reason: SignificanceReason, pct_change: Option<Decimal>) -> Self {
        Self {
            significant,
            reason,
            pct_change,
        }
    }

    /// Force significance for a fresh manual signal, keeping the measured change.
    pub fn manual_override(self) -> Self {
        Self::new(true, SignificanceReason::ManualOverride, self.pct_change)
    }
}

/// Judge a new value against the last-seen value of its type.
///
/// - no prior value: significant
/// - prior value zero: significant
/// - `demand_surge`, `competitor_price`: `pct_change >= threshold`
/// - `stock_drop`: value decreased and `pct_change >= threshold`
/// - `stock_increase`: value increased and `pct_change >= threshold`
pub fn check(
    config: &DetectorConfig,
    signal_type: SignalType,
    new_value: Decimal,
    last_value: Option<Decimal>,
) -> SignificanceCheck {
    let last = match last_value {
        Some(last) => last,
        None => return SignificanceCheck::new(true, SignificanceReason::Bootstrap, None),
    };

    if last.is_zero() {
        return SignificanceCheck::new(true, SignificanceReason::ZeroBaseline, None);
    }

    let delta = new_value - last;
    let pct_change = delta.abs() / last.abs();
    let cleared = pct_change >= config.threshold(signal_type);

    let direction_ok = match signal_type {
        SignalType::StockDrop => delta < Decimal::ZERO,
        SignalType::StockIncrease => delta > Decimal::ZERO,
        SignalType::DemandSurge | SignalType::CompetitorPrice => true,
    };

    let reason = if !direction_ok {
        SignificanceReason::WrongDirection
    } else if cleared {
        SignificanceReason::ThresholdCleared
    } else {
        SignificanceReason::BelowThreshold
    };

    SignificanceCheck::new(direction_ok && cleared, reason, Some(pct_change))
}

/// Boolean form of [`check`].
pub fn is_significant(
    config: &DetectorConfig,
    signal_type: SignalType,
    new_value: Decimal,
    last_value: Option<Decimal>,
) -> bool {
    check(config, signal_type, new_value, last_value).significant
}
