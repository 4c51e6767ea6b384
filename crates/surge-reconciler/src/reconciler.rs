//! Periodic reconciler.
//!
//! One tick:
//! 1. Read buffered views and count those inside the trailing window
//! 2. Turn the count into a `demand_surge` candidate (an injected demand
//!    signal pending since the last tick takes precedence)
//! 3. Take the pending injected signal of every other type
//! 4. Evaluate each candidate; forward significant ones to the engine
//! 5. Delete the expired views it read, by key, so views appended during
//!    the tick are never lost
//!
//! A failure for one signal type is recorded in the report and never
//! prevents the remaining types from being evaluated.

use crate::config::ReconcilerConfig;
use crate::error::{ReconcilerError, ReconcilerResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use surge_core::{Clock, MarketSignal, SignalSource, SignalType};
use surge_detector::SignificanceEvaluator;
use surge_pricing::{DecisionOutcome, PricingEngine};
use surge_store::SignalStore;
use surge_telemetry::Metrics;
use tracing::{debug, error, info, warn};

/// A per-type failure inside a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickFailure {
    pub signal_type: SignalType,
    pub error: String,
    /// Pricing cannot proceed until configuration is fixed.
    pub configuration: bool,
}

/// Summary of one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub at: DateTime<Utc>,
    /// Views inside the window.
    pub velocity: usize,
    /// Types whose candidate was evaluated.
    pub evaluated: Vec<SignalType>,
    /// Types forwarded to the engine, with the engine's outcome.
    pub forwarded: Vec<(SignalType, DecisionOutcome)>,
    pub failures: Vec<TickFailure>,
    /// Views dropped from the buffer.
    pub pruned: usize,
}

impl TickReport {
    fn new(at: DateTime<Utc>) -> Self {
        Self {
            at,
            velocity: 0,
            evaluated: Vec::new(),
            forwarded: Vec::new(),
            failures: Vec::new(),
            pruned: 0,
        }
    }

    fn fail(&mut self, signal_type: SignalType, err: &ReconcilerError) {
        Metrics::reconciler_failure(signal_type.as_str());
        if err.is_configuration() {
            error!(%signal_type, error = %err, "Reconciler stopped on configuration error");
        } else {
            warn!(%signal_type, error = %err, "Reconciler step failed");
        }
        self.failures.push(TickFailure {
            signal_type,
            error: err.to_string(),
            configuration: err.is_configuration(),
        });
    }

    pub fn was_forwarded(&self, signal_type: SignalType) -> bool {
        self.forwarded.iter().any(|(t, _)| *t == signal_type)
    }

    pub fn has_configuration_error(&self) -> bool {
        self.failures.iter().any(|f| f.configuration)
    }
}

/// Single reducer over the view buffer and pending signals.
pub struct Reconciler {
    config: ReconcilerConfig,
    store: SignalStore,
    evaluator: Arc<SignificanceEvaluator>,
    engine: Arc<PricingEngine>,
    clock: Arc<dyn Clock>,
}

impl Reconciler {
    pub fn new(
        config: ReconcilerConfig,
        store: SignalStore,
        evaluator: Arc<SignificanceEvaluator>,
        engine: Arc<PricingEngine>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            store,
            evaluator,
            engine,
            clock,
        }
    }

    pub fn interval(&self) -> Duration {
        self.config.interval()
    }

    /// Run one reconciliation pass.
    pub async fn tick(&self) -> TickReport {
        let now = self.clock.now();
        let window_ms = self.config.window_ms;
        let mut report = TickReport::new(now);

        let views = match self.store.raw_view_entries().await {
            Ok(views) => Some(views),
            Err(e) => {
                report.fail(SignalType::DemandSurge, &ReconcilerError::from(e));
                None
            }
        };

        report.velocity = views
            .iter()
            .flatten()
            .filter(|(_, v)| v.is_within(now, window_ms))
            .count();

        for signal_type in SignalType::ALL {
            let candidate = if signal_type == SignalType::DemandSurge {
                self.demand_candidate(now, report.velocity, views.is_some()).await
            } else {
                self.store
                    .take_pending(signal_type)
                    .await
                    .map_err(ReconcilerError::from)
            };

            match candidate {
                Ok(Some(signal)) => self.forward(signal, &mut report).await,
                Ok(None) => {}
                Err(e) => report.fail(signal_type, &e),
            }
        }

        if let Some(views) = views {
            // Future-dated events stay buffered; only expired ones go.
            let expired: Vec<String> = views
                .into_iter()
                .filter(|(_, v)| (now - v.timestamp).num_milliseconds() > window_ms)
                .map(|(key, _)| key)
                .collect();
            match self.store.remove_raw_views(&expired).await {
                Ok(removed) => report.pruned = removed,
                Err(e) => report.fail(SignalType::DemandSurge, &ReconcilerError::from(e)),
            }
        }

        Metrics::reconciler_tick(report.velocity);
        info!(
            velocity = report.velocity,
            evaluated = report.evaluated.len(),
            forwarded = report.forwarded.len(),
            failures = report.failures.len(),
            pruned = report.pruned,
            "Reconciler tick complete"
        );
        report
    }

    async fn demand_candidate(
        &self,
        now: DateTime<Utc>,
        velocity: usize,
        views_read: bool,
    ) -> ReconcilerResult<Option<MarketSignal>> {
        if let Some(pending) = self.store.take_pending(SignalType::DemandSurge).await? {
            debug!(signal_id = %pending.signal_id, "Injected demand signal overrides view count");
            return Ok(Some(pending));
        }
        if !views_read || velocity == 0 {
            return Ok(None);
        }

        let signal = MarketSignal::new(
            SignalType::DemandSurge,
            Decimal::from(velocity as u64),
            SignalSource::Cron,
            now,
        )?
        .with_reason(format!("{velocity} views in the last {}ms", self.config.window_ms));
        Metrics::signal_received(SignalType::DemandSurge.as_str(), SignalSource::Cron.as_str());
        Ok(Some(signal))
    }

    async fn forward(&self, signal: MarketSignal, report: &mut TickReport) {
        let signal_type = signal.signal_type;
        report.evaluated.push(signal_type);

        let evaluation = match self.evaluator.evaluate(&signal).await {
            Ok(evaluation) => evaluation,
            Err(e) => return report.fail(signal_type, &ReconcilerError::from(e)),
        };
        if !evaluation.is_significant() {
            return;
        }

        match self.engine.decide(&signal).await {
            Ok(outcome) => report.forwarded.push((signal_type, outcome)),
            Err(e) => report.fail(signal_type, &ReconcilerError::from(e)),
        }
    }
}
