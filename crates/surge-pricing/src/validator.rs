//! Validation and clamping of oracle proposals.
//!
//! Applied to every proposal, including the deterministic fallback:
//! 1. Non-numeric price -> current price, decision forced to hold
//! 2. Below base -> base
//! 3. Outside [min, max] -> nearest bound
//! 4. Move larger than `max_change_pct` of the previous price -> capped
//! 5. Decision label reconciled with the sign of the final move
//! 6. Reasoning truncated

use crate::config::PricingConfig;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use surge_core::{Decision, Price};
use surge_oracle::OracleDecision;

/// A correction applied to a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Adjustment {
    NonNumeric,
    Floor,
    MinBound,
    Ceiling,
    ChangeCapped,
    LabelCorrected,
    ReasoningTruncated,
}

impl Adjustment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NonNumeric => "non_numeric",
            Self::Floor => "floor",
            Self::MinBound => "min_bound",
            Self::Ceiling => "ceiling",
            Self::ChangeCapped => "change_capped",
            Self::LabelCorrected => "label_corrected",
            Self::ReasoningTruncated => "reasoning_truncated",
        }
    }
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proposal that is safe to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPrice {
    pub price: Price,
    pub decision: Decision,
    pub reasoning: String,
    pub adjustments: Vec<Adjustment>,
}

impl ValidatedPrice {
    pub fn was_adjusted(&self, adjustment: Adjustment) -> bool {
        self.adjustments.contains(&adjustment)
    }
}

/// Stateless validator over the configured bounds.
#[derive(Debug, Clone)]
pub struct PriceValidator {
    base_price: Price,
    min_price: Price,
    max_price: Price,
    max_change_pct: Decimal,
    max_reasoning_len: usize,
}

impl PriceValidator {
    pub fn new(config: &PricingConfig) -> Self {
        Self {
            base_price: config.base_price,
            min_price: config.min_price,
            max_price: config.max_price,
            max_change_pct: config.max_change_pct,
            max_reasoning_len: config.max_reasoning_len,
        }
    }

    /// Validate a proposal against the price in force before the signal.
    ///
    /// `previous` must itself be within bounds; the engine guarantees this
    /// by self-healing state before calling.
    pub fn validate(&self, previous: Price, proposal: &OracleDecision) -> ValidatedPrice {
        let mut adjustments = Vec::new();

        let mut price = match proposal.new_price {
            Some(p) => Price::new(p).round_cents(),
            None => {
                adjustments.push(Adjustment::NonNumeric);
                previous
            }
        };

        if price < self.base_price {
            price = self.base_price;
            adjustments.push(Adjustment::Floor);
        }
        if price < self.min_price {
            price = self.min_price;
            adjustments.push(Adjustment::MinBound);
        }
        if price > self.max_price {
            price = self.max_price;
            adjustments.push(Adjustment::Ceiling);
        }

        if let Some(capped) = self.cap_change(previous, price) {
            price = capped;
            adjustments.push(Adjustment::ChangeCapped);
        }

        let decision = Decision::from_move(previous, price);
        let claimed = if proposal.new_price.is_none() {
            Some(Decision::Hold)
        } else {
            proposal.decision
        };
        if claimed != Some(decision) {
            adjustments.push(Adjustment::LabelCorrected);
        }

        let reasoning = match truncate_chars(&proposal.reasoning, self.max_reasoning_len) {
            Some(t) => {
                adjustments.push(Adjustment::ReasoningTruncated);
                t
            }
            None => proposal.reasoning.clone(),
        };

        ValidatedPrice {
            price: price.round_cents(),
            decision,
            reasoning,
            adjustments,
        }
    }

    /// Cap `price` to within `max_change_pct` of `previous`.
    ///
    /// The cap is rounded toward `previous`, so the capped move never
    /// exceeds the limit after rounding to cents.
    fn cap_change(&self, previous: Price, price: Price) -> Option<Price> {
        let limit = previous.inner() * self.max_change_pct;
        if price > previous {
            let ceiling = Price::new(previous.inner() + limit).round_cents_with(RoundingStrategy::ToZero);
            (price > ceiling).then_some(ceiling)
        } else if price < previous {
            let floor =
                Price::new(previous.inner() - limit).round_cents_with(RoundingStrategy::AwayFromZero);
            (price < floor).then_some(floor)
        } else {
            None
        }
    }
}

/// Truncate to `max` characters; `None` when already short enough.
fn truncate_chars(text: &str, max: usize) -> Option<String> {
    match text.char_indices().nth(max) {
        Some((idx, _)) => Some(text[..idx].to_string()),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn validator() -> PriceValidator {
        PriceValidator::new(&PricingConfig::default())
    }

    fn price(d: Decimal) -> Price {
        Price::new(d)
    }

    fn proposal(p: Decimal, decision: Decision) -> OracleDecision {
        OracleDecision::new(p, decision, "because")
    }

    #[test]
    fn test_passthrough() {
        let v = validator().validate(price(dec!(100)), &proposal(dec!(110), Decision::Increase));
        assert_eq!(v.price, price(dec!(110)));
        assert_eq!(v.decision, Decision::Increase);
        assert!(v.adjustments.is_empty());
        assert_eq!(v.reasoning, "because");
    }

    #[test]
    fn test_non_numeric_holds() {
        let bad = OracleDecision {
            new_price: None,
            reasoning: "n/a".to_string(),
            decision: Some(Decision::Increase),
        };
        let v = validator().validate(price(dec!(120)), &bad);
        assert_eq!(v.price, price(dec!(120)));
        assert_eq!(v.decision, Decision::Hold);
        assert_eq!(v.adjustments, vec![Adjustment::NonNumeric]);
    }

    #[test]
    fn test_floor_beats_oracle() {
        let v = validator().validate(price(dec!(100)), &proposal(dec!(70), Decision::Decrease));
        assert_eq!(v.price, price(dec!(100)));
        assert_eq!(v.decision, Decision::Hold);
        assert!(v.was_adjusted(Adjustment::Floor));
        assert!(v.was_adjusted(Adjustment::LabelCorrected));
    }

    #[test]
    fn test_ceiling() {
        let v = validator().validate(price(dec!(190)), &proposal(dec!(400), Decision::Increase));
        assert_eq!(v.price, price(dec!(200)));
        assert!(v.was_adjusted(Adjustment::Ceiling));
        assert!(!v.was_adjusted(Adjustment::ChangeCapped));
    }

    #[test]
    fn test_change_cap_both_directions() {
        let up = validator().validate(price(dec!(100)), &proposal(dec!(180), Decision::Increase));
        assert_eq!(up.price, price(dec!(125)));
        assert!(up.was_adjusted(Adjustment::ChangeCapped));

        let down = validator().validate(price(dec!(180)), &proposal(dec!(100), Decision::Decrease));
        assert_eq!(down.price, price(dec!(135)));
        assert_eq!(down.decision, Decision::Decrease);
    }

    #[test]
    fn test_cap_rounds_toward_previous() {
        // 133.33 * 1.25 = 166.6625; 133.33 * 0.75 = 99.9975
        let prev = price(dec!(133.33));
        let up = validator().validate(prev, &proposal(dec!(199), Decision::Increase));
        assert_eq!(up.price, price(dec!(166.66)));

        let down = validator().validate(prev, &proposal(dec!(50), Decision::Decrease));
        assert_eq!(down.price, price(dec!(100)));
        assert!(down.price >= price(dec!(100)));
    }

    #[test]
    fn test_bounded_delta_holds_across_grid() {
        let v = validator();
        for prev in [dec!(100), dec!(101.37), dec!(149.99), dec!(200)] {
            for target in [dec!(0), dec!(55.55), dec!(100), dec!(123.456), dec!(199.99), dec!(1000)] {
                let out = v.validate(price(prev), &proposal(target, Decision::Hold));
                let delta = (out.price.inner() - prev).abs() / prev;
                assert!(delta <= dec!(0.25), "prev={prev} target={target} out={}", out.price);
                assert!(out.price >= price(dec!(100)));
                assert!(out.price <= price(dec!(200)));
                assert_eq!(out.decision, Decision::from_move(price(prev), out.price));
            }
        }
    }

    #[test]
    fn test_label_reconciled() {
        let v = validator().validate(price(dec!(100)), &proposal(dec!(105), Decision::Decrease));
        assert_eq!(v.decision, Decision::Increase);
        assert_eq!(v.adjustments, vec![Adjustment::LabelCorrected]);

        let missing = OracleDecision {
            new_price: Some(dec!(100)),
            reasoning: String::new(),
            decision: None,
        };
        let v = validator().validate(price(dec!(100)), &missing);
        assert_eq!(v.decision, Decision::Hold);
        assert!(v.was_adjusted(Adjustment::LabelCorrected));
    }

    #[test]
    fn test_reasoning_truncated_on_char_boundary() {
        let config = PricingConfig {
            max_reasoning_len: 4,
            ..Default::default()
        };
        let v = PriceValidator::new(&config).validate(
            price(dec!(100)),
            &OracleDecision::new(dec!(100), Decision::Hold, "prix élevé"),
        );
        assert_eq!(v.reasoning, "prix");
        assert!(v.was_adjusted(Adjustment::ReasoningTruncated));
    }
}
