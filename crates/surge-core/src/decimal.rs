//! Precision-safe price type.
//!
//! Uses `rust_decimal` for exact decimal arithmetic so that floor, ceiling
//! and maximum-change comparisons never suffer floating-point drift.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

/// Number of decimal places a persisted price carries.
pub const PRICE_DP: u32 = 2;

/// Price with exact decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Round to cents, half away from zero. The result always carries
    /// exactly two decimal places, so `100` renders as `100.00`.
    #[inline]
    pub fn round_cents(&self) -> Self {
        self.round_cents_with(RoundingStrategy::MidpointAwayFromZero)
    }

    /// Round to cents with an explicit strategy.
    #[inline]
    pub fn round_cents_with(&self, strategy: RoundingStrategy) -> Self {
        let mut cents = self.0.round_dp_with_strategy(PRICE_DP, strategy);
        cents.rescale(PRICE_DP);
        Self(cents)
    }

    /// Clamp into `[lower, upper]`.
    #[inline]
    pub fn clamp(self, lower: Price, upper: Price) -> Self {
        if self < lower {
            lower
        } else if self > upper {
            upper
        } else {
            self
        }
    }

    /// Fractional change from another price: `(self - other) / other`.
    ///
    /// Returns `None` when `other` is zero.
    #[inline]
    pub fn change_from(&self, other: Price) -> Option<Decimal> {
        if other.is_zero() {
            return None;
        }
        Some((self.0 - other.0) / other.0)
    }

    /// Percentage difference from another price.
    #[inline]
    pub fn pct_from(&self, other: Price) -> Option<Decimal> {
        self.change_from(other).map(|c| c * Decimal::from(100))
    }

    /// Lossy conversion for metrics gauges.
    #[inline]
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Price {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<Decimal> for Price {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self(self.0 * rhs)
    }
}
