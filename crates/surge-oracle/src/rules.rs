//! Deterministic rule-based pricing.
//!
//! Used directly as an oracle, and by the engine whenever the configured
//! oracle is unreachable or returns unusable output.

use crate::context::{PricingContext, StockStatus};
use crate::decision::OracleDecision;
use crate::error::OracleResult;
use crate::oracle::DecisionOracle;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use surge_core::{BoxFuture, Decision, Price, SignalType};

/// Competitor gap (fraction of current price) still treated as "moderate".
const MODERATE_GAP: Decimal = Decimal::from_parts(20, 0, 0, false, 2);
/// Step taken toward a competitor that is far below us.
const LARGE_GAP_STEP: Decimal = Decimal::from_parts(10, 0, 0, false, 2);
/// Competitor premium above which we follow upward.
const FOLLOW_UP_GAP: Decimal = Decimal::from_parts(5, 0, 0, false, 2);
const FOLLOW_UP_STEP: Decimal = Decimal::from_parts(3, 0, 0, false, 2);
const LOW_STOCK_FOLLOW_UP_STEP: Decimal = Decimal::from_parts(8, 0, 0, false, 2);
/// Increase per `demand_reference` units of view velocity.
const DEMAND_STEP: Decimal = Decimal::from_parts(5, 0, 0, false, 2);
const DEMAND_CAP: Decimal = Decimal::from_parts(15, 0, 0, false, 2);
const LOW_STOCK_AMPLIFIER: Decimal = Decimal::from_parts(15, 0, 0, false, 1);
const SCARCITY_STEP: Decimal = Decimal::from_parts(8, 0, 0, false, 2);
const SEVERE_SCARCITY_STEP: Decimal = Decimal::from_parts(15, 0, 0, false, 2);

/// Tunables for the rules that are not part of the market context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Stock below this is treated as severe scarcity.
    #[serde(default = "default_very_low_stock")]
    pub very_low_stock: Decimal,
    /// View velocity that maps to one `DEMAND_STEP` of increase.
    #[serde(default = "default_demand_reference")]
    pub demand_reference: Decimal,
}

fn default_very_low_stock() -> Decimal {
    Decimal::from(50)
}

fn default_demand_reference() -> Decimal {
    Decimal::from(100)
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            very_low_stock: default_very_low_stock(),
            demand_reference: default_demand_reference(),
        }
    }
}

/// Rule-based price for a context. Pure.
///
/// The result is always within `[floor, max_price]` and rounded to cents;
/// the engine's validator still applies the per-update change cap.
pub fn fallback_decision(ctx: &PricingContext, config: &FallbackConfig) -> OracleDecision {
    let (target, reasoning) = match ctx.signal.signal_type {
        SignalType::CompetitorPrice => competitor_rule(ctx),
        SignalType::DemandSurge => demand_rule(ctx, config),
        SignalType::StockDrop | SignalType::StockIncrease => stock_rule(ctx, config),
    };

    let price = ctx.clamp(target).round_cents();
    let decision = Decision::from_move(ctx.current_price, price);
    OracleDecision::new(price.inner(), decision, reasoning)
}

fn competitor_rule(ctx: &PricingContext) -> (Price, String) {
    let current = ctx.current_price;
    let competitor = ctx.competitor_price;
    let floor = ctx.floor();

    if competitor < floor {
        return (
            floor,
            format!(
                "Competitor at {competitor} is below our floor {floor}; not chasing predatory pricing"
            ),
        );
    }

    if competitor < current {
        let gap = (current.inner() - competitor.inner()) / current.inner();
        if gap <= MODERATE_GAP {
            let target = (competitor * (Decimal::ONE - ctx.min_margin_pct)).max(floor);
            return (
                target,
                format!(
                    "Competitor undercut by {:.1}%; matching {competitor} less {}% margin",
                    gap * Decimal::ONE_HUNDRED,
                    ctx.min_margin_pct * Decimal::ONE_HUNDRED
                ),
            );
        }
        let target = (current * (Decimal::ONE - LARGE_GAP_STEP)).max(floor);
        return (
            target,
            format!(
                "Competitor {:.1}% below us; stepping down gradually",
                gap * Decimal::ONE_HUNDRED
            ),
        );
    }

    if competitor > current {
        if ctx.stock_status == StockStatus::Low {
            return (
                current * (Decimal::ONE + LOW_STOCK_FOLLOW_UP_STEP),
                format!("Competitor above us at {competitor} and stock is low; raising price"),
            );
        }
        let premium = (competitor.inner() - current.inner()) / current.inner();
        if premium > FOLLOW_UP_GAP {
            return (
                current * (Decimal::ONE + FOLLOW_UP_STEP),
                format!("Competitor above us at {competitor}; modest increase"),
            );
        }
    }

    (current, format!("Competitor at {competitor} is in line with our price; holding"))
}

fn demand_rule(ctx: &PricingContext, config: &FallbackConfig) -> (Price, String) {
    let reference = if config.demand_reference > Decimal::ZERO {
        config.demand_reference
    } else {
        default_demand_reference()
    };

    let mut pct = (ctx.signal.value / reference * DEMAND_STEP).min(DEMAND_CAP);
    let mut note = String::new();
    if ctx.stock_status == StockStatus::Low {
        pct *= LOW_STOCK_AMPLIFIER;
        note = " (amplified: low stock)".to_string();
    }

    (
        ctx.current_price * (Decimal::ONE + pct),
        format!(
            "Demand surge of {} views; raising {:.1}%{note}",
            ctx.signal.value,
            pct * Decimal::ONE_HUNDRED
        ),
    )
}

fn stock_rule(ctx: &PricingContext, config: &FallbackConfig) -> (Price, String) {
    let current = ctx.current_price;

    if ctx.stock_level < config.very_low_stock {
        return (
            current * (Decimal::ONE + SEVERE_SCARCITY_STEP),
            format!("Stock critically low at {}; scarcity pricing", ctx.stock_level),
        );
    }

    match ctx.stock_status {
        StockStatus::Low => (
            current * (Decimal::ONE + SCARCITY_STEP),
            format!("Stock low at {}; raising price", ctx.stock_level),
        ),
        StockStatus::High if ctx.competitor_price < current => {
            let target = (ctx.competitor_price * (Decimal::ONE - ctx.min_margin_pct)).max(ctx.floor());
            (
                target,
                format!(
                    "Stock high at {} and competitor lower at {}; matching with margin",
                    ctx.stock_level, ctx.competitor_price
                ),
            )
        }
        _ => (
            current,
            format!("Stock at {} needs no price change; holding", ctx.stock_level),
        ),
    }
}

/// Oracle that always answers with the deterministic rules.
#[derive(Debug, Clone, Default)]
pub struct RuleBasedOracle {
    config: FallbackConfig,
}

impl RuleBasedOracle {
    pub fn new(config: FallbackConfig) -> Self {
        Self { config }
    }
}

impl DecisionOracle for RuleBasedOracle {
    fn name(&self) -> &str {
        "rules"
    }

    fn request_pricing_decision<'a>(
        &'a self,
        context: &'a PricingContext,
    ) -> BoxFuture<'a, OracleResult<OracleDecision>> {
        Box::pin(async move { Ok(fallback_decision(context, &self.config)) })
    }
}
