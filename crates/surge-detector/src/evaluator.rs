//! Significance evaluator.
//!
//! Wraps the pure threshold rules with signal memory: reads the last-seen
//! value, judges the change, applies the manual freshness override, and
//! always records the new value. Evaluations of the same signal type are
//! serialized so two concurrent evaluations cannot both observe an empty
//! memory and both fire.

use crate::config::DetectorConfig;
use crate::error::DetectorResult;
use crate::threshold::{self, SignificanceCheck};
use rust_decimal::Decimal;
use std::sync::Arc;
use surge_core::{Clock, MarketSignal, SignalSource, SignalType};
use surge_store::SignalStore;
use surge_telemetry::Metrics;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Result of evaluating one signal.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub signal_type: SignalType,
    pub value: Decimal,
    /// Memory before this evaluation.
    pub last_value: Option<Decimal>,
    pub check: SignificanceCheck,
}

impl Evaluation {
    pub fn is_significant(&self) -> bool {
        self.check.significant
    }
}

/// Stateful significance gate over the signal store.
pub struct SignificanceEvaluator {
    config: DetectorConfig,
    store: SignalStore,
    clock: Arc<dyn Clock>,
    /// One lock per signal type, indexed by `SignalType::index`.
    type_locks: [Mutex<()>; 4],
}

impl SignificanceEvaluator {
    pub fn new(config: DetectorConfig, store: SignalStore, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            store,
            clock,
            type_locks: Default::default(),
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Evaluate a signal and update its type's memory.
    ///
    /// The memory write happens whether or not the signal is significant;
    /// a repeated plateau value is therefore suppressed on the next pass.
    pub async fn evaluate(&self, signal: &MarketSignal) -> DetectorResult<Evaluation> {
        let signal_type = signal.signal_type;
        let _guard = self.type_locks[signal_type.index()].lock().await;

        let last_value = match self.store.signal_memory(signal_type).await {
            Ok(v) => v,
            Err(e) if e.is_corrupt() => {
                warn!(%signal_type, error = %e, "Signal memory corrupt, treating as empty");
                None
            }
            Err(e) => return Err(e.into()),
        };

        let mut check = threshold::check(&self.config, signal_type, signal.value, last_value);

        if !check.significant && self.is_fresh_manual(signal) {
            check = check.manual_override();
        }

        self.store.set_signal_memory(signal_type, signal.value).await?;

        Metrics::significance(signal_type.as_str(), check.significant);
        if check.significant {
            info!(
                signal_id = %signal.signal_id,
                %signal_type,
                source = %signal.source,
                value = %signal.value,
                last_value = ?last_value,
                pct_change = ?check.pct_change,
                reason = ?check.reason,
                "Signal significant"
            );
        } else {
            debug!(
                signal_id = %signal.signal_id,
                %signal_type,
                value = %signal.value,
                last_value = ?last_value,
                pct_change = ?check.pct_change,
                reason = ?check.reason,
                "Signal suppressed"
            );
        }

        Ok(Evaluation {
            signal_type,
            value: signal.value,
            last_value,
            check,
        })
    }

    fn is_fresh_manual(&self, signal: &MarketSignal) -> bool {
        signal.source == SignalSource::Manual
            && signal.age_ms(self.clock.now()) < self.config.manual_freshness_ms
    }
}
