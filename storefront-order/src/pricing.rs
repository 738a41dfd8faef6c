use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use storefront_shared::LineItem;

/// How half-cent values are resolved when rounding to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingPolicy {
    /// 10.005 -> 10.01
    #[default]
    HalfUp,
    /// 10.005 -> 10.00 (banker's rounding)
    HalfEven,
}

impl RoundingPolicy {
    fn strategy(self) -> RoundingStrategy {
        match self {
            RoundingPolicy::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            RoundingPolicy::HalfEven => RoundingStrategy::MidpointNearestEven,
        }
    }
}

/// A display amount: rounded to cents, always rendered with two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn rounded(value: Decimal, policy: RoundingPolicy) -> Self {
        Self(value.round_dp_with_strategy(2, policy.strategy()))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default)]
    pub rounding: RoundingPolicy,
}

/// Derives display totals from line items.
///
/// Shipping and total stay authoritative: they come from the backing store
/// and are only formatted here, never recomputed.
#[derive(Debug, Clone, Default)]
pub struct PricingCalculator {
    config: PricingConfig,
}

impl PricingCalculator {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn policy(&self) -> RoundingPolicy {
        self.config.rounding
    }

    /// Σ(unit price × quantity), rounded once at the end.
    pub fn items_subtotal(&self, items: &[LineItem]) -> Money {
        let sum: Decimal = items.iter().map(line_amount).sum();
        Money::rounded(sum, self.config.rounding)
    }

    pub fn line_subtotal(&self, item: &LineItem) -> Money {
        Money::rounded(line_amount(item), self.config.rounding)
    }

    /// Format an authoritative amount (shipping, total) for display.
    pub fn format_amount(&self, amount: Decimal) -> Money {
        Money::rounded(amount, self.config.rounding)
    }
}

fn line_amount(item: &LineItem) -> Decimal {
    item.unit_price * Decimal::from(item.quantity)
}

/// Items subtotal with the default (round-half-up) policy.
pub fn compute_items_subtotal(items: &[LineItem]) -> Money {
    PricingCalculator::default().items_subtotal(items)
}
