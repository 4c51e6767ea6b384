//! Core domain types for the surge pricing engine.
//!
//! This crate provides fundamental types used throughout the pricing system:
//! - `Price`: Precision-safe price type
//! - `SignalType`, `MarketSignal`: Typed market observations
//! - `Decision`, `PricingState`: The persisted pricing record
//! - `RawViewEvent`: Page-view telemetry feeding demand aggregation
//! - `Clock`: Time source, swappable in tests
//! - `BoxFuture`: Return type for the async seams (store, oracle, publisher)

pub mod clock;
pub mod decimal;
pub mod error;
pub mod future;
pub mod pricing;
pub mod signal;

pub use clock::{Clock, ManualClock, SystemClock};
pub use decimal::Price;
pub use error::{CoreError, Result};
pub use future::BoxFuture;
pub use pricing::{Decision, PricingState};
pub use signal::{MarketSignal, RawViewEvent, SignalSource, SignalType};
