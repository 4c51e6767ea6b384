//! Pricing decision engine for surge.
//!
//! Turns a significant market signal into a persisted, published price.
//!
//! # Key Components
//!
//! - [`PricingEngine`]: load state, build context, consult the oracle,
//!   validate, persist, publish
//! - [`PriceValidator`]: floor, bounds, per-update change cap, label
//!   reconciliation
//! - [`PricePublisher`]: latest-value publication seam
//!
//! # Decision pipeline (in `PricingEngine::decide`)
//!
//! 1. Load current price (self-healed to base when absent or out of bounds)
//! 2. Load auxiliary context and apply the incoming signal to it
//! 3. Cooldown gate -> `DecisionOutcome::CoolingDown`
//! 4. Oracle call with bounded retry, then deterministic fallback
//! 5. Validation and clamping
//! 6. Persist `PricingState` as one unit (failure aborts the signal)
//! 7. Audit log and publication (failures logged and swallowed)

pub mod config;
pub mod engine;
pub mod error;
pub mod publisher;
pub mod validator;

pub use config::PricingConfig;
pub use engine::{DecisionOutcome, PriceUpdate, PricingEngine, FALLBACK_SOURCE};
pub use error::{PricingError, PricingResult, PublishError, PublishResult};
pub use publisher::{PricePublisher, PriceRecord};
pub use validator::{Adjustment, PriceValidator, ValidatedPrice};
