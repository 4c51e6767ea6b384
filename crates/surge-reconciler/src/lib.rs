//! Periodic reconciliation and signal intake for surge.
//!
//! Ingestion only appends (views) or stores (injected signals); the
//! reconciler is the single reducer that aggregates views into a demand
//! signal, evaluates pending signals and forwards significant ones to the
//! pricing engine.

pub mod config;
pub mod error;
pub mod intake;
pub mod reconciler;

pub use config::ReconcilerConfig;
pub use error::{ReconcilerError, ReconcilerResult};
pub use intake::{ProcessOutcome, SignalIntake};
pub use reconciler::{Reconciler, TickFailure, TickReport};
