//! Application wiring and main loop.

use crate::config::{AppConfig, OracleKind};
use crate::error::AppResult;
use std::sync::Arc;
use surge_core::{Clock, SystemClock};
use surge_dashboard::{run_server, AppState, PriceBoard};
use surge_detector::SignificanceEvaluator;
use surge_oracle::{DecisionOracle, LlmOracle, RuleBasedOracle};
use surge_persistence::DecisionLog;
use surge_pricing::PricingEngine;
use surge_reconciler::{Reconciler, SignalIntake, TickReport};
use surge_store::{MemoryStore, SignalStore, StateStore};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// Main application.
pub struct Application {
    config: AppConfig,
    store: SignalStore,
    clock: Arc<dyn Clock>,
    board: Arc<PriceBoard>,
    intake: Arc<SignalIntake>,
    reconciler: Arc<Reconciler>,
}

impl Application {
    /// Build with an in-memory store, the system clock and the configured
    /// oracle.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let oracle = build_oracle(&config)?;
        Self::from_parts(config, Arc::new(MemoryStore::new()), Arc::new(SystemClock), oracle)
    }

    /// Build from explicit collaborators.
    pub fn from_parts(
        config: AppConfig,
        backend: Arc<dyn StateStore>,
        clock: Arc<dyn Clock>,
        oracle: Arc<dyn DecisionOracle>,
    ) -> AppResult<Self> {
        config.validate()?;

        let store = SignalStore::new(backend);
        let board = Arc::new(PriceBoard::new(config.dashboard.broadcast_capacity));

        let evaluator = Arc::new(SignificanceEvaluator::new(
            config.detector.clone(),
            store.clone(),
            clock.clone(),
        ));

        let mut engine = PricingEngine::new(
            config.pricing.clone(),
            store.clone(),
            oracle,
            board.clone(),
            clock.clone(),
        )?
        .with_group_id(config.dashboard.group_id.clone());
        if config.persistence.enabled {
            engine = engine.with_audit_log(DecisionLog::new(
                &config.persistence.data_dir,
                config.persistence.buffer_size,
            ));
        }
        let engine = Arc::new(engine);

        let reconciler = Arc::new(Reconciler::new(
            config.reconciler.clone(),
            store.clone(),
            evaluator.clone(),
            engine.clone(),
            clock.clone(),
        ));
        let intake = Arc::new(SignalIntake::new(store.clone(), evaluator, engine, clock.clone()));

        info!(
            oracle = ?config.oracle.kind,
            base_price = %config.pricing.base_price,
            interval_ms = config.reconciler.interval_ms,
            audit_log = config.persistence.enabled,
            "Application initialized"
        );

        Ok(Self {
            config,
            store,
            clock,
            board,
            intake,
            reconciler,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &SignalStore {
        &self.store
    }

    pub fn board(&self) -> &Arc<PriceBoard> {
        &self.board
    }

    pub fn intake(&self) -> &Arc<SignalIntake> {
        &self.intake
    }

    /// Run one reconciler pass.
    pub async fn tick(&self) -> TickReport {
        let report = self.reconciler.tick().await;
        if report.has_configuration_error() {
            error!(
                failures = ?report.failures,
                "Pricing halted by configuration error; check oracle credentials"
            );
        }
        report
    }

    /// Run until ctrl-c.
    pub async fn run(self) -> AppResult<()> {
        let server_handle = if self.config.dashboard.enabled {
            let state = AppState::new(
                self.board.clone(),
                self.intake.clone(),
                self.clock.clone(),
                self.config.dashboard.clone(),
            );
            Some(tokio::spawn(async move {
                if let Err(e) = run_server(state).await {
                    error!(error = %e, "Dashboard server failed");
                }
            }))
        } else {
            None
        };

        info!("Entering main event loop");
        let mut interval = tokio::time::interval(self.reconciler.interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = 0u64;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    ticks += 1;
                    self.tick().await;
                }

                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        info!(ticks, "Shutting down");
        if let Some(handle) = server_handle {
            handle.abort();
        }
        // Dropping the engine flushes the audit log.
        drop(self);
        Ok(())
    }
}

/// Select the oracle named by configuration.
///
/// A missing LLM key does not fail startup: every decision then surfaces a
/// configuration error instead of silently pricing with the rules.
fn build_oracle(config: &AppConfig) -> AppResult<Arc<dyn DecisionOracle>> {
    Ok(match config.oracle.kind {
        OracleKind::Rules => Arc::new(RuleBasedOracle::new(config.pricing.fallback_config())),
        OracleKind::Llm => {
            let oracle = LlmOracle::from_env(config.oracle.llm.clone())?;
            if !oracle.has_credentials() {
                warn!(
                    env = %config.oracle.llm.api_key_env,
                    "Oracle API key not set; pricing decisions will fail until it is"
                );
            }
            Arc::new(oracle)
        }
    })
}
