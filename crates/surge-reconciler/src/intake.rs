//! Inbound surface: signal submission, view telemetry, reset.
//!
//! Submission never blocks on the pricing engine: it validates and stores
//! the signal for the next reconciler tick. `process_now` is the explicit
//! debug path that evaluates and prices immediately.

use crate::error::{ReconcilerError, ReconcilerResult};
use std::sync::Arc;
use surge_core::{Clock, MarketSignal, RawViewEvent};
use surge_detector::{Evaluation, SignificanceEvaluator};
use surge_pricing::{DecisionOutcome, PriceRecord, PricingEngine};
use surge_store::SignalStore;
use surge_telemetry::Metrics;
use tracing::{debug, info, warn};

/// Result of the immediate path.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutcome {
    pub evaluation: Evaluation,
    /// `None` when the signal was not significant.
    pub decision: Option<DecisionOutcome>,
}

pub struct SignalIntake {
    store: SignalStore,
    evaluator: Arc<SignificanceEvaluator>,
    engine: Arc<PricingEngine>,
    clock: Arc<dyn Clock>,
}

impl SignalIntake {
    pub fn new(
        store: SignalStore,
        evaluator: Arc<SignificanceEvaluator>,
        engine: Arc<PricingEngine>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            evaluator,
            engine,
            clock,
        }
    }

    fn accept(&self, signal: &MarketSignal) -> ReconcilerResult<()> {
        if let Err(e) = signal.validate() {
            Metrics::signal_rejected(signal.signal_type.as_str());
            warn!(signal_id = %signal.signal_id, error = %e, "Signal rejected at intake");
            return Err(ReconcilerError::InvalidSignal(e));
        }
        Metrics::signal_received(signal.signal_type.as_str(), signal.source.as_str());
        Ok(())
    }

    /// Queue a signal for the next tick, replacing any pending one of the
    /// same type.
    pub async fn submit_signal(&self, signal: MarketSignal) -> ReconcilerResult<()> {
        self.accept(&signal)?;
        self.store.store_pending(&signal).await?;
        info!(
            signal_id = %signal.signal_id,
            signal_type = %signal.signal_type,
            source = %signal.source,
            value = %signal.value,
            "Signal queued for next tick"
        );
        Ok(())
    }

    /// Append one page view, stamped with the current time.
    pub async fn record_view(&self, item_id: &str, user_id: Option<String>) -> ReconcilerResult<RawViewEvent> {
        let event = RawViewEvent::new(item_id, user_id, self.clock.now());
        self.store.record_view(&event).await?;
        debug!(item_id, "View recorded");
        Ok(event)
    }

    /// Evaluate and, if significant, price the signal right away.
    pub async fn process_now(&self, signal: MarketSignal) -> ReconcilerResult<ProcessOutcome> {
        self.accept(&signal)?;
        let evaluation = self.evaluator.evaluate(&signal).await?;
        let decision = if evaluation.is_significant() {
            Some(self.engine.decide(&signal).await?)
        } else {
            None
        };
        Ok(ProcessOutcome { evaluation, decision })
    }

    /// Administrative reset of price, context and signal memory. The reset
    /// price is published like any decision.
    pub async fn reset(&self) -> ReconcilerResult<PriceRecord> {
        Ok(self.engine.reset().await?)
    }

    pub fn store(&self) -> &SignalStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use surge_core::{BoxFuture, Decision, ManualClock, Price, SignalSource, SignalType};
    use surge_detector::DetectorConfig;
    use surge_oracle::RuleBasedOracle;
    use surge_pricing::{PricePublisher, PriceRecord, PricingConfig, PublishResult};
    use surge_store::MemoryStore;

    struct NullPublisher;

    impl PricePublisher for NullPublisher {
        fn publish<'a>(&'a self, _record: &'a PriceRecord) -> BoxFuture<'a, PublishResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    fn intake() -> (SignalIntake, Arc<ManualClock>) {
        let store = SignalStore::new(Arc::new(MemoryStore::new()));
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let evaluator = Arc::new(SignificanceEvaluator::new(
            DetectorConfig::default(),
            store.clone(),
            clock.clone(),
        ));
        let engine = Arc::new(
            PricingEngine::new(
                PricingConfig::default(),
                store.clone(),
                Arc::new(RuleBasedOracle::default()),
                Arc::new(NullPublisher),
                clock.clone(),
            )
            .unwrap(),
        );
        (SignalIntake::new(store, evaluator, engine, clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_invalid_signal_rejected() {
        let (intake, clock) = intake();
        let mut signal = MarketSignal::new(SignalType::StockDrop, dec!(10), SignalSource::Manual, clock.now()).unwrap();
        signal.value = dec!(-5);

        let err = intake.submit_signal(signal.clone()).await.unwrap_err();
        assert!(matches!(err, ReconcilerError::InvalidSignal(_)));
        assert!(intake.store().take_pending(SignalType::StockDrop).await.unwrap().is_none());

        assert!(intake.process_now(signal).await.is_err());
        assert!(intake.store().signal_memory(SignalType::StockDrop).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_submit_does_not_price() {
        let (intake, clock) = intake();
        let signal = MarketSignal::new(SignalType::StockDrop, dec!(150), SignalSource::Manual, clock.now()).unwrap();
        intake.submit_signal(signal.clone()).await.unwrap();

        assert!(intake.store().pricing_state().await.unwrap().is_none());
        assert_eq!(
            intake.store().take_pending(SignalType::StockDrop).await.unwrap(),
            Some(signal)
        );
    }

    #[tokio::test]
    async fn test_process_now_prices_immediately() {
        let (intake, clock) = intake();
        let signal = MarketSignal::new(SignalType::StockDrop, dec!(150), SignalSource::Debug, clock.now())
            .unwrap()
            .with_reason("warehouse recount");
        let outcome = intake.process_now(signal.clone()).await.unwrap();
        assert!(outcome.evaluation.is_significant());
        let update = outcome.decision.unwrap();
        let update = update.update().unwrap();
        assert_eq!(update.record.decision, Decision::Increase);
        assert_eq!(update.record.price, Price::new(dec!(108)));

        // Same value again from a debug source: plateau, nothing priced.
        let again = MarketSignal::new(SignalType::StockDrop, dec!(150), SignalSource::Debug, clock.now()).unwrap();
        let outcome = intake.process_now(again).await.unwrap();
        assert!(!outcome.evaluation.is_significant());
        assert!(outcome.decision.is_none());
    }

    #[tokio::test]
    async fn test_reset_restores_defaults() {
        let (intake, clock) = intake();
        intake.record_view("sku-9", Some("u-1".to_string())).await.unwrap();
        let signal = MarketSignal::new(SignalType::CompetitorPrice, dec!(130), SignalSource::Debug, clock.now()).unwrap();
        intake.process_now(signal).await.unwrap();

        intake.reset().await.unwrap();
        let state = intake.store().pricing_state().await.unwrap().unwrap();
        assert_eq!(state.current_price, Price::new(dec!(100)));
        assert_eq!(state.last_decision, Decision::Hold);
        assert_eq!(intake.store().competitor_price().await.unwrap(), Some(Price::new(dec!(100))));
        assert!(intake.store().raw_views().await.unwrap().is_empty());
        assert!(intake.store().signal_memory(SignalType::CompetitorPrice).await.unwrap().is_none());
    }
}
