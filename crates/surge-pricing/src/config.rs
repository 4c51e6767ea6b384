//! Pricing engine configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use surge_core::Price;
use surge_oracle::FallbackConfig;

/// Price bounds, oracle policy and context defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Hard floor. Also the self-healing price when state is unusable.
    #[serde(default = "default_base_price")]
    pub base_price: Price,
    #[serde(default = "default_min_price")]
    pub min_price: Price,
    #[serde(default = "default_max_price")]
    pub max_price: Price,
    /// Maximum fractional move per committed update.
    #[serde(default = "default_max_change_pct")]
    pub max_change_pct: Decimal,
    /// Margin kept below a matched competitor.
    #[serde(default = "default_min_margin_pct")]
    pub min_margin_pct: Decimal,
    /// Minimum gap between decisions for non-operator signals.
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: i64,
    #[serde(default = "default_max_reasoning_len")]
    pub max_reasoning_len: usize,
    /// Retries after the first failed oracle call.
    #[serde(default = "default_oracle_retries")]
    pub oracle_retries: u32,
    /// Linear backoff unit between oracle attempts.
    #[serde(default = "default_oracle_backoff_ms")]
    pub oracle_backoff_ms: u64,
    /// Stock strictly below this is "low".
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: Decimal,
    /// Stock strictly above this is "high".
    #[serde(default = "default_high_stock_threshold")]
    pub high_stock_threshold: Decimal,
    #[serde(default = "default_very_low_stock")]
    pub very_low_stock: Decimal,
    #[serde(default = "default_demand_reference")]
    pub demand_reference: Decimal,
    #[serde(default = "default_competitor_price")]
    pub default_competitor_price: Price,
    #[serde(default = "default_stock_level")]
    pub default_stock_level: Decimal,
    #[serde(default)]
    pub default_demand_level: Decimal,
}

fn default_base_price() -> Price {
    Price::new(Decimal::ONE_HUNDRED)
}

fn default_min_price() -> Price {
    Price::new(Decimal::from(50))
}

fn default_max_price() -> Price {
    Price::new(Decimal::from(200))
}

fn default_max_change_pct() -> Decimal {
    Decimal::new(25, 2) // 0.25
}

fn default_min_margin_pct() -> Decimal {
    Decimal::new(2, 2) // 0.02
}

fn default_cooldown_ms() -> i64 {
    30_000
}

fn default_max_reasoning_len() -> usize {
    500
}

fn default_oracle_retries() -> u32 {
    2
}

fn default_oracle_backoff_ms() -> u64 {
    250
}

fn default_low_stock_threshold() -> Decimal {
    Decimal::from(200)
}

fn default_high_stock_threshold() -> Decimal {
    Decimal::from(800)
}

fn default_very_low_stock() -> Decimal {
    Decimal::from(50)
}

fn default_demand_reference() -> Decimal {
    Decimal::ONE_HUNDRED
}

fn default_competitor_price() -> Price {
    Price::new(Decimal::ONE_HUNDRED)
}

fn default_stock_level() -> Decimal {
    Decimal::ONE_THOUSAND
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_price: default_base_price(),
            min_price: default_min_price(),
            max_price: default_max_price(),
            max_change_pct: default_max_change_pct(),
            min_margin_pct: default_min_margin_pct(),
            cooldown_ms: default_cooldown_ms(),
            max_reasoning_len: default_max_reasoning_len(),
            oracle_retries: default_oracle_retries(),
            oracle_backoff_ms: default_oracle_backoff_ms(),
            low_stock_threshold: default_low_stock_threshold(),
            high_stock_threshold: default_high_stock_threshold(),
            very_low_stock: default_very_low_stock(),
            demand_reference: default_demand_reference(),
            default_competitor_price: default_competitor_price(),
            default_stock_level: default_stock_level(),
            default_demand_level: Decimal::ZERO,
        }
    }
}

impl PricingConfig {
    /// Lowest price ever persisted.
    pub fn floor(&self) -> Price {
        self.base_price.max(self.min_price)
    }

    /// Whether a stored price can be trusted as-is.
    pub fn in_bounds(&self, price: Price) -> bool {
        price >= self.floor() && price <= self.max_price
    }

    pub fn fallback_config(&self) -> FallbackConfig {
        FallbackConfig {
            very_low_stock: self.very_low_stock,
            demand_reference: self.demand_reference,
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if !self.base_price.is_positive() {
            return Err(format!("base_price ({}) must be positive", self.base_price));
        }
        if self.min_price > self.base_price {
            return Err(format!(
                "min_price ({}) must not exceed base_price ({})",
                self.min_price, self.base_price
            ));
        }
        if self.max_price < self.base_price {
            return Err(format!(
                "max_price ({}) must be >= base_price ({})",
                self.max_price, self.base_price
            ));
        }
        if self.max_change_pct <= Decimal::ZERO || self.max_change_pct > Decimal::ONE {
            return Err(format!(
                "max_change_pct ({}) must be in (0, 1]",
                self.max_change_pct
            ));
        }
        if self.min_margin_pct < Decimal::ZERO || self.min_margin_pct >= Decimal::ONE {
            return Err(format!(
                "min_margin_pct ({}) must be in [0, 1)",
                self.min_margin_pct
            ));
        }
        if self.cooldown_ms < 0 {
            return Err(format!("cooldown_ms ({}) must be non-negative", self.cooldown_ms));
        }
        if self.max_reasoning_len == 0 {
            return Err("max_reasoning_len must be > 0".to_string());
        }
        if self.low_stock_threshold >= self.high_stock_threshold {
            return Err(format!(
                "low_stock_threshold ({}) must be < high_stock_threshold ({})",
                self.low_stock_threshold, self.high_stock_threshold
            ));
        }
        if self.demand_reference <= Decimal::ZERO {
            return Err(format!(
                "demand_reference ({}) must be positive",
                self.demand_reference
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults_are_valid() {
        let config = PricingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.floor(), Price::new(dec!(100)));
        assert!(config.in_bounds(Price::new(dec!(150))));
        assert!(!config.in_bounds(Price::new(dec!(60))));
        assert!(!config.in_bounds(Price::new(dec!(250))));
    }

    #[test]
    fn test_inconsistent_bounds_rejected() {
        let config = PricingConfig {
            min_price: Price::new(dec!(120)),
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("min_price"));

        let config = PricingConfig {
            max_change_pct: dec!(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PricingConfig {
            low_stock_threshold: dec!(900),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let config: PricingConfig = toml::from_str(
            r#"
            base_price = 80
            max_price = "150.50"
            cooldown_ms = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.base_price, Price::new(dec!(80)));
        assert_eq!(config.max_price, Price::new(dec!(150.50)));
        assert_eq!(config.cooldown_ms, 0);
        assert_eq!(config.oracle_retries, 2);
        assert_eq!(config.default_stock_level, dec!(1000));
    }
}
