//! Store namespaces.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical partition of the state store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    /// Singleton `PricingState`.
    Pricing,
    /// Last-seen value per signal type (significance memory).
    Signals,
    /// Business context: competitor price, stock, demand.
    Inventory,
    /// Append-only page-view telemetry, reduced by the reconciler.
    RawViewEvents,
    /// Latest injected signal per type awaiting the next tick.
    StoredSignals,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pricing => "pricing",
            Self::Signals => "signals",
            Self::Inventory => "inventory",
            Self::RawViewEvents => "raw_view_events",
            Self::StoredSignals => "stored_signals",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
