//! Pricing decision engine.
//!
//! `decide` runs one significant signal through the full pipeline. Calls
//! are serialized: the read-modify-write over pricing state and auxiliary
//! context never interleaves between two signals.

use crate::config::PricingConfig;
use crate::error::{PricingError, PricingResult};
use crate::publisher::{PricePublisher, PriceRecord};
use crate::validator::{Adjustment, PriceValidator, ValidatedPrice};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::{Duration, Instant};
use surge_core::{Clock, Decision, MarketSignal, Price, PricingState, SignalType};
use surge_oracle::{
    fallback_decision, DecisionOracle, OracleDecision, PricingContext, SignalSummary, StockStatus,
};
use surge_persistence::{DecisionLog, DecisionRecord};
use surge_store::{SignalStore, StoreResult, RESET_COMPETITOR_PRICE, RESET_STOCK_LEVEL};
use surge_telemetry::Metrics;
use tracing::{debug, error, info, warn};

/// `priced_by` label when the deterministic fallback produced the price.
pub const FALLBACK_SOURCE: &str = "fallback";

/// What `decide` did with a signal.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionOutcome {
    /// A new pricing state was persisted.
    Committed(PriceUpdate),
    /// Context was updated but the price was left alone.
    CoolingDown { remaining_ms: i64 },
}

impl DecisionOutcome {
    pub fn update(&self) -> Option<&PriceUpdate> {
        match self {
            Self::Committed(update) => Some(update),
            Self::CoolingDown { .. } => None,
        }
    }
}

/// A committed decision.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceUpdate {
    /// The record handed to the publisher.
    pub record: PriceRecord,
    /// Oracle name, or [`FALLBACK_SOURCE`].
    pub priced_by: String,
    pub adjustments: Vec<Adjustment>,
    /// Whether publication succeeded.
    pub published: bool,
}

/// Auxiliary business context, each field independently defaulted.
#[derive(Debug, Clone, Copy)]
struct Inventory {
    competitor_price: Price,
    stock_level: Decimal,
    demand_level: Decimal,
}

/// Turns significant signals into persisted, published prices.
pub struct PricingEngine {
    config: PricingConfig,
    validator: PriceValidator,
    store: SignalStore,
    oracle: Arc<dyn DecisionOracle>,
    publisher: Arc<dyn PricePublisher>,
    audit: Option<Mutex<DecisionLog>>,
    clock: Arc<dyn Clock>,
    group_id: String,
    decide_lock: tokio::sync::Mutex<()>,
}

impl PricingEngine {
    pub fn new(
        config: PricingConfig,
        store: SignalStore,
        oracle: Arc<dyn DecisionOracle>,
        publisher: Arc<dyn PricePublisher>,
        clock: Arc<dyn Clock>,
    ) -> PricingResult<Self> {
        config.validate().map_err(PricingError::InvalidConfig)?;

        Ok(Self {
            validator: PriceValidator::new(&config),
            config,
            store,
            oracle,
            publisher,
            audit: None,
            clock,
            group_id: "default".to_string(),
            decide_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Append every committed decision to a JSON Lines audit log.
    pub fn with_audit_log(mut self, log: DecisionLog) -> Self {
        self.audit = Some(Mutex::new(log));
        self
    }

    /// Logical price group used for publication.
    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = group_id.into();
        self
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    pub fn oracle_name(&self) -> &str {
        self.oracle.name()
    }

    /// Process one significant signal.
    ///
    /// Returns `Err` only for configuration errors and store failures;
    /// a failed persist leaves the prior state intact and publishes
    /// nothing. Oracle and publication failures degrade gracefully.
    pub async fn decide(&self, signal: &MarketSignal) -> PricingResult<DecisionOutcome> {
        let _guard = self.decide_lock.lock().await;
        let now = self.clock.now();
        let now_ms = now.timestamp_millis();

        let state = self.load_state().await?;
        let previous = state.current_price;

        let mut inventory = self.load_inventory().await?;
        self.apply_signal(&mut inventory, signal).await?;

        if let Some(remaining_ms) = self.cooldown_remaining(&state, signal, now_ms) {
            Metrics::cooldown_skip();
            info!(
                signal_id = %signal.signal_id,
                signal_type = %signal.signal_type,
                remaining_ms,
                "Pricing cooldown active, context updated only"
            );
            return Ok(DecisionOutcome::CoolingDown { remaining_ms });
        }

        let context = self.build_context(previous, &inventory, signal);
        let (proposal, priced_by) = self.consult_oracle(&context).await?;
        let validated = self.validator.validate(previous, &proposal);
        for adjustment in &validated.adjustments {
            Metrics::adjustment(adjustment.as_str());
        }

        let new_state = PricingState {
            current_price: validated.price,
            last_pricing_timestamp: now_ms,
            last_decision: validated.decision,
            last_reason: validated.reasoning.clone(),
        };
        if let Err(e) = self.store.set_pricing_state(&new_state).await {
            error!(
                signal_id = %signal.signal_id,
                error = %e,
                "Failed to persist new price, signal aborted"
            );
            return Err(PricingError::Persist(e));
        }

        Metrics::decision_committed(
            validated.decision.as_str(),
            signal.signal_type.as_str(),
            validated.price.to_f64(),
        );
        info!(
            signal_id = %signal.signal_id,
            signal_type = %signal.signal_type,
            source = %signal.source,
            previous = %previous,
            price = %validated.price,
            decision = %validated.decision,
            priced_by = %priced_by,
            adjustments = ?validated.adjustments,
            "Price committed"
        );

        self.audit(signal, previous, &validated, &priced_by, now_ms);

        let record = PriceRecord {
            group_id: self.group_id.clone(),
            price: validated.price,
            previous_price: previous,
            decision: validated.decision,
            reasoning: validated.reasoning,
            competitor_price: Some(inventory.competitor_price),
            stock_level: Some(inventory.stock_level),
            velocity: Some(inventory.demand_level),
            timestamp: now,
        };

        let published = match self.publisher.publish(&record).await {
            Ok(()) => true,
            Err(e) => {
                Metrics::publish_failed();
                warn!(error = %e, group_id = %record.group_id, "Publish failed, price remains committed");
                false
            }
        };

        Ok(DecisionOutcome::Committed(PriceUpdate {
            record,
            priced_by,
            adjustments: validated.adjustments,
            published,
        }))
    }

    /// Administrative reset: restore the store defaults and publish the
    /// reset price so subscribers never keep showing the old one.
    ///
    /// Serialized with `decide`. A publish failure is logged and swallowed
    /// like any other publication.
    pub async fn reset(&self) -> PricingResult<PriceRecord> {
        let _guard = self.decide_lock.lock().await;
        let previous = match self.store.pricing_state().await {
            Ok(Some(state)) => state.current_price,
            _ => self.config.base_price,
        };

        let state = self.store.reset().await?;
        let record = PriceRecord {
            group_id: self.group_id.clone(),
            price: state.current_price,
            previous_price: previous,
            decision: Decision::Hold,
            reasoning: state.last_reason,
            competitor_price: Some(Price::new(RESET_COMPETITOR_PRICE).round_cents()),
            stock_level: Some(RESET_STOCK_LEVEL),
            velocity: None,
            timestamp: self.clock.now(),
        };

        if let Err(e) = self.publisher.publish(&record).await {
            Metrics::publish_failed();
            warn!(error = %e, group_id = %record.group_id, "Publish of reset price failed");
        }
        info!(previous = %previous, price = %record.price, "Pricing reset");
        Ok(record)
    }

    /// Current pricing state, healed to the base price when absent,
    /// undecodable or out of bounds.
    async fn load_state(&self) -> PricingResult<PricingState> {
        let stored = match self.store.pricing_state().await {
            Ok(state) => state,
            Err(e) if e.is_corrupt() => {
                warn!(error = %e, "Pricing state corrupt, healing to base price");
                None
            }
            Err(e) => return Err(e.into()),
        };

        Ok(match stored {
            Some(state) if self.config.in_bounds(state.current_price) => state,
            Some(state) => {
                warn!(
                    stored = %state.current_price,
                    base = %self.config.base_price,
                    "Stored price out of bounds, healing to base price"
                );
                PricingState {
                    current_price: self.config.base_price,
                    ..state
                }
            }
            None => PricingState::initial(self.config.base_price),
        })
    }

    async fn load_inventory(&self) -> PricingResult<Inventory> {
        let competitor_price = tolerate_corrupt("competitor_price", self.store.competitor_price().await)?
            .unwrap_or(self.config.default_competitor_price);
        let stock_level = tolerate_corrupt("stock_level", self.store.stock_level().await)?
            .unwrap_or(self.config.default_stock_level);
        let demand_level = tolerate_corrupt("demand_level", self.store.demand_level().await)?
            .unwrap_or(self.config.default_demand_level);

        Ok(Inventory {
            competitor_price,
            stock_level,
            demand_level,
        })
    }

    /// Write the signal's value into the matching context field.
    async fn apply_signal(&self, inventory: &mut Inventory, signal: &MarketSignal) -> PricingResult<()> {
        match signal.signal_type {
            SignalType::CompetitorPrice => {
                inventory.competitor_price = Price::new(signal.value);
                self.store.set_competitor_price(inventory.competitor_price).await?;
            }
            SignalType::StockDrop | SignalType::StockIncrease => {
                inventory.stock_level = signal.value;
                self.store.set_stock_level(signal.value).await?;
            }
            SignalType::DemandSurge => {
                inventory.demand_level = signal.value;
                self.store.set_demand_level(signal.value).await?;
            }
        }
        Ok(())
    }

    fn cooldown_remaining(&self, state: &PricingState, signal: &MarketSignal, now_ms: i64) -> Option<i64> {
        if signal.source.is_operator() || state.last_pricing_timestamp <= 0 {
            return None;
        }
        let elapsed = now_ms - state.last_pricing_timestamp;
        (elapsed < self.config.cooldown_ms).then(|| self.config.cooldown_ms - elapsed)
    }

    fn build_context(&self, current: Price, inventory: &Inventory, signal: &MarketSignal) -> PricingContext {
        let competitor = inventory.competitor_price;
        PricingContext {
            current_price: current,
            base_price: self.config.base_price,
            min_price: self.config.min_price,
            max_price: self.config.max_price,
            max_change_pct: self.config.max_change_pct,
            min_margin_pct: self.config.min_margin_pct,
            competitor_price: competitor,
            competitor_delta: competitor.inner() - current.inner(),
            competitor_delta_pct: competitor
                .pct_from(current)
                .map(|p| p.round_dp(2))
                .unwrap_or_default(),
            stock_level: inventory.stock_level,
            stock_status: StockStatus::classify(
                inventory.stock_level,
                self.config.low_stock_threshold,
                self.config.high_stock_threshold,
            ),
            demand_level: inventory.demand_level,
            signal: SignalSummary::from(signal),
        }
    }

    /// Ask the oracle, retrying recoverable failures, then fall back.
    async fn consult_oracle(&self, context: &PricingContext) -> PricingResult<(OracleDecision, String)> {
        let name = self.oracle.name();
        let attempts = self.config.oracle_retries + 1;

        for attempt in 1..=attempts {
            let started = Instant::now();
            let result = self.oracle.request_pricing_decision(context).await;
            let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

            match result {
                Ok(decision) => {
                    Metrics::oracle_call(name, "ok", latency_ms);
                    debug!(oracle = name, attempt, latency_ms, "Oracle responded");
                    return Ok((decision, name.to_string()));
                }
                Err(e) if e.is_fatal() => {
                    Metrics::oracle_call(name, e.kind(), latency_ms);
                    error!(oracle = name, error = %e, "Oracle configuration error, signal aborted");
                    return Err(PricingError::Configuration(e.to_string()));
                }
                Err(e) => {
                    Metrics::oracle_call(name, e.kind(), latency_ms);
                    warn!(oracle = name, attempt, attempts, error = %e, "Oracle call failed");
                    if attempt < attempts {
                        let backoff = self.config.oracle_backoff_ms * u64::from(attempt);
                        tokio::time::sleep(Duration::from_millis(backoff)).await;
                    }
                }
            }
        }

        Metrics::fallback_used();
        warn!(oracle = name, "Oracle retries exhausted, using deterministic fallback");
        Ok((
            fallback_decision(context, &self.config.fallback_config()),
            FALLBACK_SOURCE.to_string(),
        ))
    }

    fn audit(
        &self,
        signal: &MarketSignal,
        previous: Price,
        validated: &ValidatedPrice,
        priced_by: &str,
        now_ms: i64,
    ) {
        let Some(audit) = &self.audit else {
            return;
        };
        let record = DecisionRecord {
            timestamp_ms: now_ms,
            signal_id: signal.signal_id.clone(),
            signal_type: signal.signal_type.to_string(),
            signal_value: signal.value.to_string(),
            source: signal.source.as_str().to_string(),
            previous_price: previous.to_string(),
            new_price: validated.price.to_string(),
            decision: validated.decision.to_string(),
            reasoning: validated.reasoning.clone(),
            priced_by: priced_by.to_string(),
            adjustments: validated.adjustments.iter().map(|a| a.to_string()).collect(),
        };
        if let Err(e) = audit.lock().append(record) {
            warn!(error = %e, "Failed to append decision to audit log");
        }
    }
}

fn tolerate_corrupt<T>(field: &str, result: StoreResult<Option<T>>) -> PricingResult<Option<T>> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.is_corrupt() => {
            warn!(field, error = %e, "Context field corrupt, using default");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PublishError, PublishResult};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use serde_json::Value;
    use std::collections::VecDeque;
    use surge_core::{BoxFuture, Decision, ManualClock, SignalSource};
    use surge_oracle::{OracleError, OracleResult, RuleBasedOracle};
    use surge_store::{MemoryStore, Namespace, StateStore, StoreError};

    /// Oracle replaying a fixed script; errors once the script runs out.
    struct ScriptedOracle {
        script: Mutex<VecDeque<OracleResult<OracleDecision>>>,
        calls: Mutex<usize>,
    }

    impl ScriptedOracle {
        fn new(script: Vec<OracleResult<OracleDecision>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> usize {
            *self.calls.lock()
        }
    }

    impl DecisionOracle for ScriptedOracle {
        fn name(&self) -> &str {
            "scripted"
        }

        fn request_pricing_decision<'a>(
            &'a self,
            _context: &'a PricingContext,
        ) -> BoxFuture<'a, OracleResult<OracleDecision>> {
            *self.calls.lock() += 1;
            let next = self
                .script
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(OracleError::Transport("script exhausted".to_string())));
            Box::pin(async move { next })
        }
    }

    #[derive(Default)]
    struct RecordingPublisher {
        records: Mutex<Vec<PriceRecord>>,
        fail: bool,
    }

    impl RecordingPublisher {
        fn failing() -> Arc<Self> {
            Arc::new(Self {
                records: Mutex::new(Vec::new()),
                fail: true,
            })
        }

        fn records(&self) -> Vec<PriceRecord> {
            self.records.lock().clone()
        }
    }

    impl PricePublisher for RecordingPublisher {
        fn publish<'a>(&'a self, record: &'a PriceRecord) -> BoxFuture<'a, PublishResult<()>> {
            Box::pin(async move {
                if self.fail {
                    return Err(PublishError::Backend("unreachable".to_string()));
                }
                self.records.lock().push(record.clone());
                Ok(())
            })
        }
    }

    /// Delegates to memory but refuses writes to the pricing namespace.
    struct FailingStore {
        inner: MemoryStore,
    }

    impl StateStore for FailingStore {
        fn get<'a>(&'a self, ns: Namespace, key: &'a str) -> BoxFuture<'a, surge_store::StoreResult<Option<Value>>> {
            self.inner.get(ns, key)
        }

        fn set<'a>(&'a self, ns: Namespace, key: &'a str, value: Value) -> BoxFuture<'a, surge_store::StoreResult<()>> {
            if ns == Namespace::Pricing {
                return Box::pin(async { Err(StoreError::Backend("disk full".to_string())) });
            }
            self.inner.set(ns, key, value)
        }

        fn remove<'a>(&'a self, ns: Namespace, key: &'a str) -> BoxFuture<'a, surge_store::StoreResult<Option<Value>>> {
            self.inner.remove(ns, key)
        }

        fn get_all(&self, ns: Namespace) -> BoxFuture<'_, surge_store::StoreResult<Vec<(String, Value)>>> {
            self.inner.get_all(ns)
        }

        fn clear(&self, ns: Namespace) -> BoxFuture<'_, surge_store::StoreResult<()>> {
            self.inner.clear(ns)
        }
    }

    fn test_config() -> PricingConfig {
        PricingConfig {
            oracle_backoff_ms: 0,
            ..Default::default()
        }
    }

    struct Harness {
        engine: PricingEngine,
        store: SignalStore,
        publisher: Arc<RecordingPublisher>,
        clock: Arc<ManualClock>,
    }

    fn harness(oracle: Arc<dyn DecisionOracle>) -> Harness {
        harness_with(oracle, Arc::new(RecordingPublisher::default()), Arc::new(MemoryStore::new()))
    }

    fn harness_with(
        oracle: Arc<dyn DecisionOracle>,
        publisher: Arc<RecordingPublisher>,
        backend: Arc<dyn StateStore>,
    ) -> Harness {
        let store = SignalStore::new(backend);
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let engine = PricingEngine::new(test_config(), store.clone(), oracle, publisher.clone(), clock.clone())
            .unwrap();
        Harness {
            engine,
            store,
            publisher,
            clock,
        }
    }

    fn signal(h: &Harness, t: SignalType, v: Decimal, source: SignalSource) -> MarketSignal {
        MarketSignal::new(t, v, source, h.clock.now()).unwrap()
    }

    fn rules() -> Arc<dyn DecisionOracle> {
        Arc::new(RuleBasedOracle::default())
    }

    #[tokio::test]
    async fn test_competitor_below_floor_holds_at_base() {
        let h = harness(rules());
        let outcome = h
            .engine
            .decide(&signal(&h, SignalType::CompetitorPrice, dec!(70), SignalSource::Manual))
            .await
            .unwrap();

        let update = outcome.update().unwrap();
        assert_eq!(update.record.price, Price::new(dec!(100)));
        assert_eq!(update.record.decision, Decision::Hold);
        assert_eq!(update.priced_by, "rules");

        let state = h.store.pricing_state().await.unwrap().unwrap();
        assert_eq!(state.current_price, Price::new(dec!(100)));
        assert_eq!(h.store.competitor_price().await.unwrap(), Some(Price::new(dec!(70))));
    }

    #[tokio::test]
    async fn test_oracle_below_floor_is_clamped() {
        let oracle = ScriptedOracle::new(vec![Ok(OracleDecision::new(dec!(60), Decision::Decrease, "cut"))]);
        let h = harness(oracle);
        let outcome = h
            .engine
            .decide(&signal(&h, SignalType::DemandSurge, dec!(5), SignalSource::Debug))
            .await
            .unwrap();
        let update = outcome.update().unwrap();
        assert_eq!(update.record.price, Price::new(dec!(100)));
        assert_eq!(update.record.decision, Decision::Hold);
        assert!(update.adjustments.contains(&Adjustment::Floor));
    }

    #[tokio::test]
    async fn test_increase_is_capped_and_labelled() {
        let oracle = ScriptedOracle::new(vec![Ok(OracleDecision::new(dec!(190), Decision::Hold, "spike"))]);
        let h = harness(oracle);
        let outcome = h
            .engine
            .decide(&signal(&h, SignalType::DemandSurge, dec!(400), SignalSource::Manual))
            .await
            .unwrap();
        let update = outcome.update().unwrap();
        assert_eq!(update.record.price, Price::new(dec!(125)));
        assert_eq!(update.record.decision, Decision::Increase);
        assert_eq!(update.record.previous_price, Price::new(dec!(100)));
        assert_eq!(update.record.velocity, Some(dec!(400)));
    }

    #[tokio::test]
    async fn test_recoverable_errors_retry_then_fallback() {
        let oracle = ScriptedOracle::new(vec![
            Err(OracleError::Timeout),
            Err(OracleError::Malformed("prose".to_string())),
            Err(OracleError::Http {
                status: 503,
                body: String::new(),
            }),
        ]);
        let h = harness(oracle.clone());
        h.store.set_stock_level(dec!(150)).await.unwrap();

        let outcome = h
            .engine
            .decide(&signal(&h, SignalType::StockDrop, dec!(150), SignalSource::Manual))
            .await
            .unwrap();
        assert_eq!(oracle.calls(), 3);
        let update = outcome.update().unwrap();
        assert_eq!(update.priced_by, FALLBACK_SOURCE);
        assert_eq!(update.record.decision, Decision::Increase);
        assert!(update.record.price > Price::new(dec!(100)));
    }

    #[tokio::test]
    async fn test_retry_succeeds_on_second_attempt() {
        let oracle = ScriptedOracle::new(vec![
            Err(OracleError::Transport("reset".to_string())),
            Ok(OracleDecision::new(dec!(104), Decision::Increase, "ok")),
        ]);
        let h = harness(oracle.clone());
        let outcome = h
            .engine
            .decide(&signal(&h, SignalType::DemandSurge, dec!(30), SignalSource::Manual))
            .await
            .unwrap();
        assert_eq!(oracle.calls(), 2);
        assert_eq!(outcome.update().unwrap().priced_by, "scripted");
        assert_eq!(outcome.update().unwrap().record.price, Price::new(dec!(104)));
    }

    #[tokio::test]
    async fn test_missing_credentials_propagates() {
        let oracle = ScriptedOracle::new(vec![Err(OracleError::MissingCredentials("no key".to_string()))]);
        let h = harness(oracle.clone());
        let err = h
            .engine
            .decide(&signal(&h, SignalType::CompetitorPrice, dec!(90), SignalSource::Manual))
            .await
            .unwrap_err();

        assert!(matches!(err, PricingError::Configuration(_)));
        assert_eq!(oracle.calls(), 1);
        assert!(h.store.pricing_state().await.unwrap().is_none());
        assert!(h.publisher.records().is_empty());
    }

    #[tokio::test]
    async fn test_persist_failure_blocks_publication() {
        let h = harness_with(
            rules(),
            Arc::new(RecordingPublisher::default()),
            Arc::new(FailingStore {
                inner: MemoryStore::new(),
            }),
        );
        let err = h
            .engine
            .decide(&signal(&h, SignalType::StockDrop, dec!(150), SignalSource::Manual))
            .await
            .unwrap_err();
        assert!(matches!(err, PricingError::Persist(_)));
        assert!(h.publisher.records().is_empty());
    }

    #[tokio::test]
    async fn test_publish_failure_keeps_price() {
        let h = harness_with(rules(), RecordingPublisher::failing(), Arc::new(MemoryStore::new()));
        let outcome = h
            .engine
            .decide(&signal(&h, SignalType::StockDrop, dec!(150), SignalSource::Manual))
            .await
            .unwrap();
        let update = outcome.update().unwrap();
        assert!(!update.published);

        let state = h.store.pricing_state().await.unwrap().unwrap();
        assert_eq!(state.current_price, update.record.price);
        assert_eq!(state.last_decision, Decision::Increase);
    }

    #[tokio::test]
    async fn test_reset_publishes_reset_price() {
        let h = harness(rules());
        h.engine
            .decide(&signal(&h, SignalType::StockDrop, dec!(150), SignalSource::Manual))
            .await
            .unwrap();

        let record = h.engine.reset().await.unwrap();
        assert_eq!(record.previous_price, Price::new(dec!(108)));
        assert_eq!(record.price.to_string(), "100.00");
        assert_eq!(record.decision, Decision::Hold);

        let records = h.publisher.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1], record);

        let state = h.store.pricing_state().await.unwrap().unwrap();
        assert_eq!(state.current_price, record.price);
        assert_eq!(state.last_decision, record.decision);
        assert_eq!(state.last_reason, record.reasoning);
        assert_eq!(h.store.stock_level().await.unwrap(), Some(dec!(1000)));
    }

    #[tokio::test]
    async fn test_cooldown_skips_cron_but_not_manual() {
        let oracle = ScriptedOracle::new(vec![
            Ok(OracleDecision::new(dec!(110), Decision::Increase, "first")),
            Ok(OracleDecision::new(dec!(115), Decision::Increase, "manual")),
        ]);
        let h = harness(oracle.clone());

        h.engine
            .decide(&signal(&h, SignalType::DemandSurge, dec!(120), SignalSource::Cron))
            .await
            .unwrap();

        h.clock.advance(chrono::Duration::seconds(10));
        let outcome = h
            .engine
            .decide(&signal(&h, SignalType::CompetitorPrice, dec!(130), SignalSource::Cron))
            .await
            .unwrap();
        assert_eq!(outcome, DecisionOutcome::CoolingDown { remaining_ms: 20_000 });
        assert_eq!(oracle.calls(), 1);
        // Context still moves during cooldown.
        assert_eq!(h.store.competitor_price().await.unwrap(), Some(Price::new(dec!(130))));

        let outcome = h
            .engine
            .decide(&signal(&h, SignalType::DemandSurge, dec!(300), SignalSource::Manual))
            .await
            .unwrap();
        assert_eq!(outcome.update().unwrap().record.price, Price::new(dec!(115)));
        assert_eq!(h.publisher.records().len(), 2);
    }

    #[tokio::test]
    async fn test_out_of_bounds_state_self_heals() {
        let oracle = ScriptedOracle::new(vec![Ok(OracleDecision::new(dec!(100), Decision::Hold, "steady"))]);
        let h = harness(oracle);
        h.store
            .set_pricing_state(&PricingState::initial(Price::new(dec!(5000))))
            .await
            .unwrap();

        let outcome = h
            .engine
            .decide(&signal(&h, SignalType::DemandSurge, dec!(10), SignalSource::Debug))
            .await
            .unwrap();
        let update = outcome.update().unwrap();
        assert_eq!(update.record.previous_price, Price::new(dec!(100)));
        assert_eq!(update.record.decision, Decision::Hold);
    }

    #[tokio::test]
    async fn test_corrupt_state_self_heals() {
        let backend = Arc::new(MemoryStore::new());
        backend
            .set(Namespace::Pricing, "state", Value::String("garbage".to_string()))
            .await
            .unwrap();
        let h = harness_with(rules(), Arc::new(RecordingPublisher::default()), backend);

        let outcome = h
            .engine
            .decide(&signal(&h, SignalType::CompetitorPrice, dec!(100), SignalSource::Manual))
            .await
            .unwrap();
        assert_eq!(outcome.update().unwrap().record.previous_price, Price::new(dec!(100)));
        assert!(h.store.pricing_state().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_audit_log_records_decision() {
        let dir = tempfile::TempDir::new().unwrap();
        let h = harness(rules());
        let engine = h.engine.with_audit_log(DecisionLog::new(dir.path(), 1));
        let sig = MarketSignal::new(SignalType::CompetitorPrice, dec!(70), SignalSource::Manual, h.clock.now()).unwrap();
        engine.decide(&sig).await.unwrap();
        drop(engine);

        let file = std::fs::read_dir(dir.path()).unwrap().next().unwrap().unwrap().path();
        let content = std::fs::read_to_string(file).unwrap();
        let record: DecisionRecord = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(record.signal_id, sig.signal_id);
        assert_eq!(record.priced_by, "rules");
        assert_eq!(record.decision, "hold");
    }
}
