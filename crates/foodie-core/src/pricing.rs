//! # Pricing
//!
//! Composes an order's subtotal, delivery fee, discount, tax and total.
//!
//! ## Order of Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  subtotal = Σ unit_price × quantity                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  FreeDelivery applied?  ──► delivery_fee = 0   (minimum not checked)    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  promotion applies?  (subtotal ≥ promo.minimum_order)                   │
//! │       │                                                                 │
//! │       ├── FreeDelivery ──► discount = standard fee (299)                │
//! │       ├── Percentage   ──► discount = subtotal × bps (cap if set)       │
//! │       ├── FixedAmount  ──► discount = min(value, subtotal)              │
//! │       └── (none)       ──► discount = 0                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  tax   = subtotal × tax_rate         (pre-discount subtotal)            │
//! │  total = max(0, subtotal + delivery_fee + tax − discount)               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A free-delivery promotion that meets its minimum both zeroes the fee and
//! deducts the standard fee again, so the customer is credited twice. Below
//! the minimum the fee is still waived but nothing is deducted.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::promotion::{AppliedPromo, Discount};
use crate::{DEFAULT_TAX_RATE_BPS, STANDARD_DELIVERY_FEE_CENTS};

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate in basis points (800 = 8%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Rate as a percentage, for display only.
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate(DEFAULT_TAX_RATE_BPS)
    }
}

// =============================================================================
// Pricing Policy
// =============================================================================

/// The fee and tax inputs that do not come from the cart itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PricingPolicy {
    pub delivery_fee: Money,
    pub tax_rate: TaxRate,
}

impl PricingPolicy {
    /// Standard $2.99 delivery and 8% tax.
    pub const fn standard() -> Self {
        PricingPolicy {
            delivery_fee: Money::from_cents(STANDARD_DELIVERY_FEE_CENTS),
            tax_rate: TaxRate::from_bps(DEFAULT_TAX_RATE_BPS),
        }
    }

    /// Policy for a specific restaurant's delivery fee.
    pub const fn with_delivery_fee(mut self, fee: Money) -> Self {
        self.delivery_fee = fee;
        self
    }

    pub const fn with_tax_rate(mut self, rate: TaxRate) -> Self {
        self.tax_rate = rate;
        self
    }
}

impl Default for PricingPolicy {
    fn default() -> Self {
        PricingPolicy::standard()
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Priced breakdown of an order or cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub discount: Money,
    pub tax: Money,
    pub total: Money,
}

/// Prices an order from its food subtotal.
///
/// ## Example
/// ```rust
/// use foodie_core::money::Money;
/// use foodie_core::pricing::{price_order, PricingPolicy};
/// use foodie_core::promotion::{AppliedPromo, Discount};
///
/// let promo = AppliedPromo::new("SAVE5", "Five off", Discount::FixedAmount(Money::from_cents(500)));
/// let totals = price_order(Money::from_cents(3497), &PricingPolicy::standard(), Some(&promo));
///
/// assert_eq!(totals.discount.cents(), 500);
/// assert_eq!(totals.tax.cents(), 280);
/// assert_eq!(totals.total.cents(), 3497 + 299 + 280 - 500);
/// ```
pub fn price_order(
    subtotal: Money,
    policy: &PricingPolicy,
    promo: Option<&AppliedPromo>,
) -> OrderTotals {
    let delivery_fee = match promo.map(|p| &p.discount) {
        Some(Discount::FreeDelivery) => Money::zero(),
        _ => policy.delivery_fee,
    };

    let discount = promo
        .filter(|p| p.applies_to(subtotal))
        .map(|p| discount_amount(&p.discount, p.max_discount, subtotal))
        .unwrap_or_default();

    let tax = subtotal.calculate_tax(policy.tax_rate);
    let total = (subtotal + delivery_fee + tax - discount).clamp_non_negative();

    OrderTotals {
        subtotal,
        delivery_fee,
        discount,
        tax,
        total,
    }
}

/// Amount subtracted from the order for a discount kind.
///
/// Free delivery is worth the standard delivery fee whatever the
/// restaurant charges.
pub fn discount_amount(discount: &Discount, cap: Option<Money>, subtotal: Money) -> Money {
    match discount {
        Discount::Percentage(bps) => {
            let amount = subtotal.percentage(*bps);
            match cap {
                Some(cap) => amount.min(cap),
                None => amount,
            }
        }
        Discount::FixedAmount(value) => (*value).min(subtotal).clamp_non_negative(),
        Discount::FreeDelivery => Money::from_cents(STANDARD_DELIVERY_FEE_CENTS),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn promo(discount: Discount) -> AppliedPromo {
        AppliedPromo::new("TEST", "Test promo", discount)
    }

    #[test]
    fn test_no_promotion() {
        let totals = price_order(Money::from_cents(3497), &PricingPolicy::standard(), None);

        assert_eq!(totals.subtotal.cents(), 3497);
        assert_eq!(totals.delivery_fee.cents(), 299);
        assert_eq!(totals.discount.cents(), 0);
        assert_eq!(totals.tax.cents(), 280);
        assert_eq!(totals.total.cents(), 4076);
    }

    #[test]
    fn test_percentage_discount() {
        let p = promo(Discount::Percentage(2000));
        let totals = price_order(Money::from_cents(5000), &PricingPolicy::standard(), Some(&p));

        assert_eq!(totals.discount.cents(), 1000);
        // Tax is on the pre-discount subtotal
        assert_eq!(totals.tax.cents(), 400);
        assert_eq!(totals.total.cents(), 5000 + 299 + 400 - 1000);
    }

    #[test]
    fn test_percentage_discount_is_capped() {
        let p = promo(Discount::Percentage(2000)).with_max_discount(Money::from_cents(1000));
        let totals = price_order(Money::from_cents(10000), &PricingPolicy::standard(), Some(&p));

        assert_eq!(totals.discount.cents(), 1000);
    }

    #[test]
    fn test_fixed_discount_never_exceeds_subtotal() {
        let p = promo(Discount::FixedAmount(Money::from_cents(5000)));
        let totals = price_order(Money::from_cents(1200), &PricingPolicy::standard(), Some(&p));

        assert_eq!(totals.discount.cents(), 1200);
        assert_eq!(totals.total.cents(), 299 + 96);
    }

    #[test]
    fn test_free_delivery_waives_fee_and_deducts_standard_fee() {
        let p = promo(Discount::FreeDelivery);
        let totals = price_order(Money::from_cents(2000), &PricingPolicy::standard(), Some(&p));

        assert!(totals.delivery_fee.is_zero());
        assert_eq!(totals.discount.cents(), 299);
        assert_eq!(totals.tax.cents(), 160);
        assert_eq!(totals.total.cents(), 1861);
    }

    #[test]
    fn test_free_delivery_below_minimum_still_waives_fee() {
        let p = promo(Discount::FreeDelivery).with_minimum_order(Money::from_cents(2500));
        let totals = price_order(Money::from_cents(2000), &PricingPolicy::standard(), Some(&p));

        assert!(totals.delivery_fee.is_zero());
        assert!(totals.discount.is_zero());
        assert_eq!(totals.total.cents(), 2160);
    }

    #[test]
    fn test_free_delivery_deducts_standard_fee_not_restaurant_fee() {
        let policy = PricingPolicy::standard().with_delivery_fee(Money::from_cents(499));
        let p = promo(Discount::FreeDelivery);
        let totals = price_order(Money::from_cents(2000), &policy, Some(&p));

        assert!(totals.delivery_fee.is_zero());
        assert_eq!(totals.discount.cents(), 299);
    }

    #[test]
    fn test_promotion_below_minimum_is_ignored() {
        let p = promo(Discount::Percentage(2000)).with_minimum_order(Money::from_cents(1500));
        let totals = price_order(Money::from_cents(1000), &PricingPolicy::standard(), Some(&p));

        assert_eq!(totals.delivery_fee.cents(), 299);
        assert!(totals.discount.is_zero());
    }

    #[test]
    fn test_total_is_clamped_at_zero() {
        let policy = PricingPolicy::standard()
            .with_delivery_fee(Money::zero())
            .with_tax_rate(TaxRate::zero());
        let p = promo(Discount::FixedAmount(Money::from_cents(999)));
        let totals = price_order(Money::from_cents(500), &policy, Some(&p));

        assert_eq!(totals.discount.cents(), 500);
        assert!(totals.total.is_zero());
    }

    #[test]
    fn test_empty_cart_still_charges_delivery() {
        let totals = price_order(Money::zero(), &PricingPolicy::standard(), None);
        assert_eq!(totals.total.cents(), 299);
    }

    #[test]
    fn test_tax_rate_percentage() {
        assert!((TaxRate::from_bps(825).percentage() - 8.25).abs() < 0.001);
    }
}
