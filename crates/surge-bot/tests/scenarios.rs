//! End-to-end pricing scenarios through intake, reconciler, engine and
//! publication board.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use surge_bot::{AppConfig, Application};
use surge_core::{BoxFuture, Clock, Decision, ManualClock, MarketSignal, Price, SignalSource, SignalType};
use surge_oracle::{
    DecisionOracle, LlmOracle, LlmOracleConfig, OracleDecision, OracleError, OracleResult, PricingContext,
    RuleBasedOracle,
};
use surge_persistence::DecisionRecord;
use surge_pricing::{DecisionOutcome, PriceUpdate, FALLBACK_SOURCE};
use surge_store::{MemoryStore, RESET_REASON};
use tempfile::TempDir;

struct Harness {
    app: Application,
    clock: Arc<ManualClock>,
    audit_dir: TempDir,
}

fn harness(oracle: Arc<dyn DecisionOracle>) -> Harness {
    let audit_dir = TempDir::new().unwrap();
    let mut config = AppConfig::default();
    config.pricing.oracle_backoff_ms = 0;
    config.persistence.data_dir = audit_dir.path().to_path_buf();

    let clock = Arc::new(ManualClock::new(Utc::now()));
    let app = Application::from_parts(config, Arc::new(MemoryStore::new()), clock.clone(), oracle).unwrap();
    Harness { app, clock, audit_dir }
}

fn rules() -> Arc<dyn DecisionOracle> {
    Arc::new(RuleBasedOracle::default())
}

impl Harness {
    fn signal(&self, t: SignalType, v: Decimal, source: SignalSource) -> MarketSignal {
        MarketSignal::new(t, v, source, self.clock.now()).unwrap()
    }

    async fn submit(&self, t: SignalType, v: Decimal, source: SignalSource) {
        self.app.intake().submit_signal(self.signal(t, v, source)).await.unwrap();
    }

    fn audit_lines(&self) -> Vec<DecisionRecord> {
        let Some(entry) = std::fs::read_dir(self.audit_dir.path()).unwrap().next() else {
            return Vec::new();
        };
        let content = std::fs::read_to_string(entry.unwrap().path()).unwrap();
        content.lines().map(|l| serde_json::from_str(l).unwrap()).collect()
    }
}

fn committed(outcome: &DecisionOutcome) -> &PriceUpdate {
    outcome.update().expect("decision should have been committed")
}

/// Always times out.
struct UnreachableOracle {
    calls: AtomicUsize,
}

impl DecisionOracle for UnreachableOracle {
    fn name(&self) -> &str {
        "unreachable"
    }

    fn request_pricing_decision<'a>(
        &'a self,
        _context: &'a PricingContext,
    ) -> BoxFuture<'a, OracleResult<OracleDecision>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Err(OracleError::Timeout) })
    }
}

/// Cycles through extreme and malformed proposals.
struct WildOracle {
    next: AtomicUsize,
}

impl DecisionOracle for WildOracle {
    fn name(&self) -> &str {
        "wild"
    }

    fn request_pricing_decision<'a>(
        &'a self,
        _context: &'a PricingContext,
    ) -> BoxFuture<'a, OracleResult<OracleDecision>> {
        let proposals = [
            Some((dec!(10), Decision::Increase)),
            Some((dec!(500), Decision::Decrease)),
            Some((dec!(99.999), Decision::Hold)),
            None,
            Some((dec!(180), Decision::Increase)),
            Some((dec!(0.01), Decision::Decrease)),
            Some((dec!(124.995), Decision::Increase)),
        ];
        let i = self.next.fetch_add(1, Ordering::SeqCst) % proposals.len();
        let decision = match proposals[i] {
            Some((price, label)) => OracleDecision::new(price, label, "wild guess"),
            None => OracleDecision {
                new_price: None,
                reasoning: "price unknown".to_string(),
                decision: Some(Decision::Increase),
            },
        };
        Box::pin(async move { Ok(decision) })
    }
}

#[tokio::test]
async fn test_predatory_competitor_price_holds_at_floor() {
    let h = harness(rules());
    h.app.intake().reset().await.unwrap();

    h.submit(SignalType::CompetitorPrice, dec!(70), SignalSource::Manual).await;
    let report = h.app.tick().await;

    let (_, outcome) = report
        .forwarded
        .iter()
        .find(|(t, _)| *t == SignalType::CompetitorPrice)
        .expect("bootstrap competitor signal is significant");
    let update = committed(outcome);
    assert_eq!(update.record.price, Price::new(dec!(100)));
    assert_eq!(update.record.decision, Decision::Hold);

    let state = h.app.store().pricing_state().await.unwrap().unwrap();
    assert_eq!(state.current_price, Price::new(dec!(100)));
    assert_eq!(state.last_decision, Decision::Hold);
}

#[tokio::test]
async fn test_repeated_demand_needs_a_real_change() {
    let h = harness(rules());
    h.app.intake().reset().await.unwrap();

    h.submit(SignalType::DemandSurge, dec!(120), SignalSource::Cron).await;
    assert!(h.app.tick().await.was_forwarded(SignalType::DemandSurge));

    h.clock.advance(Duration::seconds(60));
    h.submit(SignalType::DemandSurge, dec!(120), SignalSource::Cron).await;
    let second = h.app.tick().await;
    assert_eq!(second.evaluated, vec![SignalType::DemandSurge]);
    assert!(!second.was_forwarded(SignalType::DemandSurge));
    assert_eq!(
        h.app.store().signal_memory(SignalType::DemandSurge).await.unwrap(),
        Some(dec!(120))
    );

    h.clock.advance(Duration::seconds(60));
    h.submit(SignalType::DemandSurge, dec!(138), SignalSource::Cron).await;
    assert!(h.app.tick().await.was_forwarded(SignalType::DemandSurge));
}

#[tokio::test]
async fn test_low_stock_uses_fallback_and_raises_price() {
    let oracle = Arc::new(UnreachableOracle {
        calls: AtomicUsize::new(0),
    });
    let h = harness(oracle.clone());
    h.app.intake().reset().await.unwrap();

    h.submit(SignalType::StockDrop, dec!(150), SignalSource::Manual).await;
    let report = h.app.tick().await;

    let (_, outcome) = &report.forwarded[0];
    let update = committed(outcome);
    assert_eq!(update.priced_by, FALLBACK_SOURCE);
    assert_eq!(update.record.decision, Decision::Increase);
    assert!(update.record.price > Price::new(dec!(100)));
    assert_eq!(update.record.stock_level, Some(dec!(150)));
    assert_eq!(oracle.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_reset_submit_roundtrip_matches_published_record() {
    let h = harness(rules());
    h.app.intake().reset().await.unwrap();

    let signal = h.signal(SignalType::CompetitorPrice, dec!(110), SignalSource::Manual);
    let signal_id = signal.signal_id.clone();
    h.app.intake().submit_signal(signal).await.unwrap();
    h.app.tick().await;

    let state = h.app.store().pricing_state().await.unwrap().unwrap();
    let record = h.app.board().latest("default").unwrap();

    assert_eq!(state.current_price, record.price);
    assert_eq!(state.last_decision, record.decision);
    assert_eq!(state.last_reason, record.reasoning);
    assert_eq!(record.previous_price, Price::new(dec!(100)));
    assert_eq!(record.decision, Decision::from_move(record.previous_price, record.price));
    assert_eq!(record.competitor_price, Some(Price::new(dec!(110))));

    let audit = h.audit_lines();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].signal_id, signal_id);
    assert_eq!(audit[0].new_price, record.price.to_string());
}

#[tokio::test]
async fn test_untrusted_oracle_never_breaks_price_invariants() {
    let h = harness(Arc::new(WildOracle {
        next: AtomicUsize::new(0),
    }));
    h.app.intake().reset().await.unwrap();

    let mut value = dec!(10);
    let mut committed_count = 0;
    for _ in 0..14 {
        let signal = h.signal(SignalType::DemandSurge, value, SignalSource::Debug);
        let processed = h.app.intake().process_now(signal).await.unwrap();
        value *= dec!(2);

        let Some(DecisionOutcome::Committed(update)) = processed.decision else {
            continue;
        };
        committed_count += 1;
        let prev = update.record.previous_price;
        let price = update.record.price;

        assert!(price >= Price::new(dec!(100)), "floor violated: {price}");
        assert!(price <= Price::new(dec!(200)), "ceiling violated: {price}");
        assert!((price.inner() - prev.inner()).abs() / prev.inner() <= dec!(0.25));
        assert_eq!(update.record.decision, Decision::from_move(prev, price));
        assert_eq!(price, price.round_cents());

        let state = h.app.store().pricing_state().await.unwrap().unwrap();
        assert_eq!(state.current_price, price);
    }
    assert_eq!(committed_count, 14);
}

#[tokio::test]
async fn test_missing_credentials_abort_without_touching_price() {
    let oracle = Arc::new(LlmOracle::new(LlmOracleConfig::default(), None).unwrap());
    let h = harness(oracle);
    h.app.intake().reset().await.unwrap();

    let err = h
        .app
        .intake()
        .process_now(h.signal(SignalType::CompetitorPrice, dec!(90), SignalSource::Debug))
        .await
        .unwrap_err();
    assert!(err.is_configuration());

    h.submit(SignalType::StockDrop, dec!(150), SignalSource::Manual).await;
    let report = h.app.tick().await;
    assert!(report.has_configuration_error());

    let state = h.app.store().pricing_state().await.unwrap().unwrap();
    assert_eq!(state.current_price, Price::new(dec!(100)));
    assert_eq!(state.last_pricing_timestamp, 0);
    let published = h.app.board().latest("default").unwrap();
    assert_eq!(published.price, Price::new(dec!(100)));
    assert_eq!(published.reasoning, RESET_REASON);
    assert!(h.audit_lines().is_empty());
}
