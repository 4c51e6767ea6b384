//! Prometheus metrics for surge.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A registration failure
//! means duplicate metric names, a programming error that should crash at
//! first use rather than silently drop observations.

use crate::error::{TelemetryError, TelemetryResult};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram_vec, register_int_counter,
    register_int_gauge, CounterVec, Encoder, Gauge, HistogramVec, IntCounter, IntGauge,
    TextEncoder,
};

/// Signals accepted at intake.
pub static SIGNALS_RECEIVED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "surge_signals_received_total",
        "Signals accepted at intake",
        &["signal_type", "source"]
    )
    .unwrap()
});

/// Signals rejected at intake.
pub static SIGNALS_REJECTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "surge_signals_rejected_total",
        "Signals rejected by validation",
        &["signal_type"]
    )
    .unwrap()
});

/// Significance outcomes.
/// Labels: outcome (significant/suppressed)
pub static SIGNIFICANCE_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "surge_significance_total",
        "Significance evaluations by outcome",
        &["signal_type", "outcome"]
    )
    .unwrap()
});

/// Oracle call outcomes.
/// Labels: outcome (ok/error/config_error)
pub static ORACLE_CALLS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "surge_oracle_calls_total",
        "Decision oracle calls by outcome",
        &["oracle", "outcome"]
    )
    .unwrap()
});

/// Oracle call latency.
pub static ORACLE_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "surge_oracle_latency_ms",
        "Decision oracle latency in milliseconds",
        &["oracle"],
        vec![5.0, 25.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0]
    )
    .unwrap()
});

/// Deterministic fallback activations.
pub static FALLBACK_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "surge_fallback_total",
        "Decisions priced by the rule-based fallback"
    )
    .unwrap()
});

/// Validation adjustments applied to oracle proposals.
pub static ADJUSTMENTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "surge_price_adjustments_total",
        "Validation adjustments by kind",
        &["kind"]
    )
    .unwrap()
});

/// Committed decisions.
pub static DECISIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "surge_decisions_total",
        "Committed pricing decisions",
        &["decision", "signal_type"]
    )
    .unwrap()
});

/// Decisions skipped by the cooldown gate.
pub static COOLDOWN_SKIPS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "surge_cooldown_skips_total",
        "Signals that arrived during the decision cooldown"
    )
    .unwrap()
});

/// Current persisted price.
pub static CURRENT_PRICE: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!("surge_current_price", "Current persisted price").unwrap()
});

/// Publication failures (non-fatal).
pub static PUBLISH_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "surge_publish_failures_total",
        "Failed publications to live subscribers"
    )
    .unwrap()
});

/// Reconciler ticks.
pub static RECONCILER_TICKS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("surge_reconciler_ticks_total", "Completed reconciler ticks").unwrap()
});

/// Per-type reconciler failures.
pub static RECONCILER_FAILURES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "surge_reconciler_failures_total",
        "Reconciler failures by signal type",
        &["signal_type"]
    )
    .unwrap()
});

/// Views inside the active demand window after the last tick.
pub static VIEW_WINDOW_SIZE: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "surge_view_window_size",
        "Raw view events inside the active window"
    )
    .unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    pub fn signal_received(signal_type: &str, source: &str) {
        SIGNALS_RECEIVED_TOTAL
            .with_label_values(&[signal_type, source])
            .inc();
    }

    pub fn signal_rejected(signal_type: &str) {
        SIGNALS_REJECTED_TOTAL.with_label_values(&[signal_type]).inc();
    }

    pub fn significance(signal_type: &str, significant: bool) {
        let outcome = if significant { "significant" } else { "suppressed" };
        SIGNIFICANCE_TOTAL
            .with_label_values(&[signal_type, outcome])
            .inc();
    }

    pub fn oracle_call(oracle: &str, outcome: &str, latency_ms: f64) {
        ORACLE_CALLS_TOTAL.with_label_values(&[oracle, outcome]).inc();
        ORACLE_LATENCY_MS
            .with_label_values(&[oracle])
            .observe(latency_ms);
    }

    pub fn fallback_used() {
        FALLBACK_TOTAL.inc();
    }

    pub fn adjustment(kind: &str) {
        ADJUSTMENTS_TOTAL.with_label_values(&[kind]).inc();
    }

    pub fn decision_committed(decision: &str, signal_type: &str, price: f64) {
        DECISIONS_TOTAL
            .with_label_values(&[decision, signal_type])
            .inc();
        CURRENT_PRICE.set(price);
    }

    pub fn cooldown_skip() {
        COOLDOWN_SKIPS_TOTAL.inc();
    }

    pub fn publish_failed() {
        PUBLISH_FAILURES_TOTAL.inc();
    }

    pub fn reconciler_tick(window_size: usize) {
        RECONCILER_TICKS_TOTAL.inc();
        VIEW_WINDOW_SIZE.set(window_size as i64);
    }

    pub fn reconciler_failure(signal_type: &str) {
        RECONCILER_FAILURES_TOTAL
            .with_label_values(&[signal_type])
            .inc();
    }

    /// Render the default registry in text exposition format.
    pub fn gather_text() -> TelemetryResult<String> {
        let encoder = TextEncoder::new();
        let families = prometheus::gather();
        let mut buf = Vec::new();
        encoder
            .encode(&families, &mut buf)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_render() {
        Metrics::signal_received("demand_surge", "cron");
        Metrics::significance("demand_surge", true);
        Metrics::decision_committed("increase", "demand_surge", 105.0);

        let text = Metrics::gather_text().unwrap();
        assert!(text.contains("surge_signals_received_total"));
        assert!(text.contains("surge_current_price"));
    }
}
