//! Typed facade over the namespaced store.
//!
//! Keys per namespace:
//! - `pricing/state`: the whole `PricingState`, written as one unit
//! - `signals/<signal_type>`: last-seen value for significance comparison
//! - `inventory/{competitor_price,stock_level,demand_level}`
//! - `raw_view_events/<uuid>`: one entry per page view
//! - `stored_signals/<signal_type>`: latest injected signal awaiting a tick

use crate::error::{StoreError, StoreResult};
use crate::namespace::Namespace;
use crate::state_store::StateStore;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use surge_core::{MarketSignal, Price, PricingState, RawViewEvent, SignalType};
use tracing::{debug, info, warn};

/// Price restored by the administrative reset.
pub const RESET_PRICE: Decimal = Decimal::ONE_HUNDRED;
/// Competitor price restored by the administrative reset.
pub const RESET_COMPETITOR_PRICE: Decimal = Decimal::ONE_HUNDRED;
/// Stock level restored by the administrative reset.
pub const RESET_STOCK_LEVEL: Decimal = Decimal::ONE_THOUSAND;
/// `last_reason` recorded by the administrative reset.
pub const RESET_REASON: &str = "administrative reset";

const PRICING_STATE_KEY: &str = "state";
const COMPETITOR_PRICE_KEY: &str = "competitor_price";
const STOCK_LEVEL_KEY: &str = "stock_level";
const DEMAND_LEVEL_KEY: &str = "demand_level";

/// Typed access to pricing, signal memory, inventory and raw telemetry.
///
/// Cheap to clone; all clones share the same backend.
#[derive(Clone)]
pub struct SignalStore {
    backend: Arc<dyn StateStore>,
}

impl SignalStore {
    pub fn new(backend: Arc<dyn StateStore>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn StateStore> {
        &self.backend
    }

    async fn read<T: DeserializeOwned>(&self, ns: Namespace, key: &str) -> StoreResult<Option<T>> {
        match self.backend.get(ns, key).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| StoreError::Decode {
                    namespace: ns,
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    async fn write<T: Serialize>(&self, ns: Namespace, key: &str, value: &T) -> StoreResult<()> {
        let value = serde_json::to_value(value)?;
        self.backend.set(ns, key, value).await
    }

    // --- pricing -----------------------------------------------------------

    pub async fn pricing_state(&self) -> StoreResult<Option<PricingState>> {
        self.read(Namespace::Pricing, PRICING_STATE_KEY).await
    }

    /// Persist the whole pricing record under a single key.
    pub async fn set_pricing_state(&self, state: &PricingState) -> StoreResult<()> {
        self.write(Namespace::Pricing, PRICING_STATE_KEY, state).await
    }

    // --- significance memory -----------------------------------------------

    pub async fn signal_memory(&self, signal_type: SignalType) -> StoreResult<Option<Decimal>> {
        self.read(Namespace::Signals, signal_type.as_str()).await
    }

    pub async fn set_signal_memory(&self, signal_type: SignalType, value: Decimal) -> StoreResult<()> {
        self.write(Namespace::Signals, signal_type.as_str(), &value).await
    }

    // --- inventory / business context --------------------------------------

    pub async fn competitor_price(&self) -> StoreResult<Option<Price>> {
        self.read(Namespace::Inventory, COMPETITOR_PRICE_KEY).await
    }

    pub async fn set_competitor_price(&self, price: Price) -> StoreResult<()> {
        self.write(Namespace::Inventory, COMPETITOR_PRICE_KEY, &price).await
    }

    pub async fn stock_level(&self) -> StoreResult<Option<Decimal>> {
        self.read(Namespace::Inventory, STOCK_LEVEL_KEY).await
    }

    pub async fn set_stock_level(&self, level: Decimal) -> StoreResult<()> {
        self.write(Namespace::Inventory, STOCK_LEVEL_KEY, &level).await
    }

    pub async fn demand_level(&self) -> StoreResult<Option<Decimal>> {
        self.read(Namespace::Inventory, DEMAND_LEVEL_KEY).await
    }

    pub async fn set_demand_level(&self, level: Decimal) -> StoreResult<()> {
        self.write(Namespace::Inventory, DEMAND_LEVEL_KEY, &level).await
    }

    // --- raw view events ---------------------------------------------------

    /// Append one view. Writers other than the reconciler only ever append.
    pub async fn record_view(&self, event: &RawViewEvent) -> StoreResult<()> {
        let key = uuid::Uuid::new_v4().simple().to_string();
        self.write(Namespace::RawViewEvents, &key, event).await
    }

    /// All buffered views. Undecodable entries are skipped.
    pub async fn raw_views(&self) -> StoreResult<Vec<RawViewEvent>> {
        Ok(self
            .raw_view_entries()
            .await?
            .into_iter()
            .map(|(_, event)| event)
            .collect())
    }

    /// Buffered views with their storage keys, for the reducer.
    pub async fn raw_view_entries(&self) -> StoreResult<Vec<(String, RawViewEvent)>> {
        let entries = self.backend.get_all(Namespace::RawViewEvents).await?;
        Ok(decode_all(entries, Namespace::RawViewEvents))
    }

    /// Delete the given view keys, returning how many were present.
    ///
    /// Only the reconciler calls this. Views appended after its read have
    /// keys it never saw, so they survive.
    pub async fn remove_raw_views(&self, keys: &[String]) -> StoreResult<usize> {
        let mut removed = 0;
        for key in keys {
            if self.backend.remove(Namespace::RawViewEvents, key).await?.is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    // --- injected signals awaiting a tick ----------------------------------

    /// Store an injected signal, replacing any older pending one of its type.
    pub async fn store_pending(&self, signal: &MarketSignal) -> StoreResult<()> {
        self.write(Namespace::StoredSignals, signal.signal_type.as_str(), signal)
            .await
    }

    /// Remove and return the pending signal of a type.
    pub async fn take_pending(&self, signal_type: SignalType) -> StoreResult<Option<MarketSignal>> {
        let key = signal_type.as_str();
        match self.backend.remove(Namespace::StoredSignals, key).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| StoreError::Decode {
                    namespace: Namespace::StoredSignals,
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    // --- administration ----------------------------------------------------

    /// Restore price, competitor price and stock to fixed defaults and
    /// forget all transient signal memory. Returns the pricing state written.
    pub async fn reset(&self) -> StoreResult<PricingState> {
        let state = PricingState {
            last_reason: RESET_REASON.to_string(),
            ..PricingState::initial(Price::new(RESET_PRICE).round_cents())
        };
        self.set_pricing_state(&state).await?;
        self.set_competitor_price(Price::new(RESET_COMPETITOR_PRICE).round_cents())
            .await?;
        self.set_stock_level(RESET_STOCK_LEVEL).await?;
        self.backend.remove(Namespace::Inventory, DEMAND_LEVEL_KEY).await?;
        self.backend.clear(Namespace::Signals).await?;
        self.backend.clear(Namespace::StoredSignals).await?;
        self.backend.clear(Namespace::RawViewEvents).await?;

        info!(
            price = %RESET_PRICE,
            competitor_price = %RESET_COMPETITOR_PRICE,
            stock_level = %RESET_STOCK_LEVEL,
            "Signal store reset"
        );
        Ok(state)
    }
}

fn decode_all<T: DeserializeOwned>(entries: Vec<(String, Value)>, ns: Namespace) -> Vec<(String, T)> {
    let total = entries.len();
    let decoded: Vec<(String, T)> = entries
        .into_iter()
        .filter_map(|(key, v)| match serde_json::from_value(v) {
            Ok(item) => Some((key, item)),
            Err(e) => {
                warn!(namespace = %ns, key = %key, error = %e, "Skipping undecodable entry");
                None
            }
        })
        .collect();
    if decoded.len() != total {
        debug!(namespace = %ns, total, decoded = decoded.len(), "Partial decode");
    }
    decoded
}
