//! Publication seam.
//!
//! A publisher keeps at most one current record per price group; each
//! publish overwrites the previous one. The engine treats publication as
//! fire-and-forget.

use crate::error::PublishResult;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use surge_core::{BoxFuture, Decision, Price};

/// The latest price as seen by subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub group_id: String,
    pub price: Price,
    pub previous_price: Price,
    pub decision: Decision,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitor_price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_level: Option<Decimal>,
    /// Demand level (recent view count) at decision time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
}

/// Latest-value publication channel.
pub trait PricePublisher: Send + Sync {
    fn publish<'a>(&'a self, record: &'a PriceRecord) -> BoxFuture<'a, PublishResult<()>>;
}
