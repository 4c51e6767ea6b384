//! Signal significance evaluation for surge.
//!
//! Decides whether a new observation moved far enough from the last-seen
//! value of its type to warrant a pricing decision, and records the new
//! value as the last-seen one regardless of the outcome.

pub mod config;
pub mod error;
pub mod evaluator;
pub mod threshold;

pub use config::DetectorConfig;
pub use error::{DetectorError, DetectorResult};
pub use evaluator::{Evaluation, SignificanceEvaluator};
pub use threshold::{is_significant, SignificanceCheck, SignificanceReason};
