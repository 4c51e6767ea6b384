//! Pricing decision oracles for surge.
//!
//! An oracle proposes `{new_price, reasoning, decision}` for a
//! `PricingContext`. Its output is untrusted: the pricing engine always
//! validates and clamps it before persisting.
//!
//! Implementations:
//! - `RuleBasedOracle`: deterministic rules, also the engine's fallback
//! - `LlmOracle`: chat-completions endpoint returning a JSON object

pub mod context;
pub mod decision;
pub mod error;
pub mod llm;
pub mod oracle;
pub mod rules;

pub use context::{PricingContext, SignalSummary, StockStatus};
pub use decision::OracleDecision;
pub use error::{OracleError, OracleResult};
pub use llm::{LlmOracle, LlmOracleConfig};
pub use oracle::DecisionOracle;
pub use rules::{fallback_decision, FallbackConfig, RuleBasedOracle};
