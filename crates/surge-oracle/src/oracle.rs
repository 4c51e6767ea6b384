//! Decision oracle trait.

use crate::context::PricingContext;
use crate::decision::OracleDecision;
use crate::error::OracleResult;
use surge_core::BoxFuture;

/// Capability that proposes a price for a market context.
///
/// Injected into the pricing engine at construction time, which lets
/// tests run the engine against a deterministic oracle.
pub trait DecisionOracle: Send + Sync {
    /// Label used in logs, metrics and the audit trail.
    fn name(&self) -> &str;

    fn request_pricing_decision<'a>(
        &'a self,
        context: &'a PricingContext,
    ) -> BoxFuture<'a, OracleResult<OracleDecision>>;
}
