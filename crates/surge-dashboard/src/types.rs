//! Dashboard API types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use surge_core::{SignalSource, SignalType};
use surge_detector::SignificanceReason;
use surge_pricing::PriceRecord;

/// WebSocket message.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardMessage {
    /// Latest record, sent on connect.
    Snapshot { price: Option<PriceRecord> },
    /// A new price was published.
    Price(PriceRecord),
}

/// Body of `POST /api/signals`.
#[derive(Debug, Clone, Deserialize)]
pub struct SignalRequest {
    #[serde(rename = "type")]
    pub signal_type: SignalType,
    pub value: Decimal,
    #[serde(default)]
    pub reason: Option<String>,
    /// Defaults to `manual`, or `debug` on the immediate path.
    #[serde(default)]
    pub source: Option<SignalSource>,
}

/// Body of `POST /api/views`.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewRequest {
    pub item_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Response for a queued signal.
#[derive(Debug, Clone, Serialize)]
pub struct SignalAccepted {
    pub signal_id: String,
    pub status: &'static str,
}

/// Response for an immediately processed signal.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessResponse {
    pub signal_id: String,
    pub significant: bool,
    pub reason: SignificanceReason,
    /// `committed`, `cooling_down` or `not_significant`.
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<PriceRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_ms: Option<i64>,
}
