//! # Promotions
//!
//! Promo codes and the rules deciding whether one may be applied.
//!
//! ## Eligibility Checks (in order)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Promotion::check(subtotal, restaurant_id, now)                         │
//! │       │                                                                 │
//! │       ├── inactive or outside valid_from..valid_until ──► Expired       │
//! │       ├── usage_count >= usage_limit ──────────────────► UsageLimit     │
//! │       ├── subtotal < minimum_order ────────────────────► BelowMinimum   │
//! │       ├── restaurant not in applicable list ───────────► NotApplicable  │
//! │       │                                                                 │
//! │       └── OK ──► AppliedPromo (what the cart carries)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::money::Money;
use crate::pricing::discount_amount;

// =============================================================================
// Discount
// =============================================================================

/// Discount kind as stored in the `discount_type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum DiscountType {
    Percentage,
    FixedAmount,
    FreeDelivery,
}

/// What a promotion takes off.
///
/// `Percentage` carries basis points (2000 = 20%); `FixedAmount` carries cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "discountType", content = "discountValue", rename_all = "snake_case")]
pub enum Discount {
    Percentage(u32),
    FixedAmount(Money),
    FreeDelivery,
}

impl Discount {
    /// Rebuilds a discount from its stored `(type, value)` pair.
    pub fn from_parts(kind: DiscountType, value: i64) -> Self {
        match kind {
            DiscountType::Percentage => Discount::Percentage(value.clamp(0, 10_000) as u32),
            DiscountType::FixedAmount => Discount::FixedAmount(Money::from_cents(value)),
            DiscountType::FreeDelivery => Discount::FreeDelivery,
        }
    }

    pub fn kind(&self) -> DiscountType {
        match self {
            Discount::Percentage(_) => DiscountType::Percentage,
            Discount::FixedAmount(_) => DiscountType::FixedAmount,
            Discount::FreeDelivery => DiscountType::FreeDelivery,
        }
    }

    /// Stored value: bps for percentage, cents for fixed, zero for free delivery.
    pub fn value(&self) -> i64 {
        match self {
            Discount::Percentage(bps) => *bps as i64,
            Discount::FixedAmount(amount) => amount.cents(),
            Discount::FreeDelivery => 0,
        }
    }
}

// =============================================================================
// Promotion
// =============================================================================

/// A promotion record.
///
/// The discount is flattened into `discountType` / `discountValue` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub code: String,
    #[serde(flatten)]
    pub discount: Discount,
    pub minimum_order: Money,
    pub max_discount: Option<Money>,
    pub usage_limit: Option<i64>,
    pub usage_count: i64,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub is_active: bool,
    /// Restaurant ids the code is limited to. Empty means every restaurant.
    pub applicable_restaurants: Vec<i64>,
    pub created_at: DateTime<Utc>,
}

/// Why a promo code was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromoRejection {
    #[error("Invalid or expired promo code")]
    Expired,

    #[error("Promo code usage limit exceeded")]
    UsageLimitReached,

    #[error("Minimum order amount is {minimum}")]
    BelowMinimum { minimum: Money },

    #[error("Promo code not valid for this restaurant")]
    NotApplicableToRestaurant,
}

impl Promotion {
    /// Active and inside its validity window.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.valid_from <= now && now <= self.valid_until
    }

    pub fn usage_exhausted(&self) -> bool {
        matches!(self.usage_limit, Some(limit) if self.usage_count >= limit)
    }

    /// Runs every eligibility rule and returns the promotion in cart form.
    pub fn check(
        &self,
        subtotal: Money,
        restaurant_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<AppliedPromo, PromoRejection> {
        if !self.is_live_at(now) {
            return Err(PromoRejection::Expired);
        }

        if self.usage_exhausted() {
            return Err(PromoRejection::UsageLimitReached);
        }

        if subtotal < self.minimum_order {
            return Err(PromoRejection::BelowMinimum {
                minimum: self.minimum_order,
            });
        }

        if let Some(restaurant_id) = restaurant_id {
            if !self.applicable_restaurants.is_empty()
                && !self.applicable_restaurants.contains(&restaurant_id)
            {
                return Err(PromoRejection::NotApplicableToRestaurant);
            }
        }

        Ok(self.to_applied())
    }

    pub fn to_applied(&self) -> AppliedPromo {
        AppliedPromo {
            code: self.code.clone(),
            title: self.title.clone(),
            discount: self.discount,
            minimum_order: self.minimum_order,
            max_discount: self.max_discount,
        }
    }
}

// =============================================================================
// Applied Promo
// =============================================================================

/// The slice of a promotion a cart needs to price itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedPromo {
    pub code: String,
    pub title: String,
    #[serde(flatten)]
    pub discount: Discount,
    pub minimum_order: Money,
    pub max_discount: Option<Money>,
}

impl AppliedPromo {
    pub fn new(code: impl Into<String>, title: impl Into<String>, discount: Discount) -> Self {
        AppliedPromo {
            code: code.into(),
            title: title.into(),
            discount,
            minimum_order: Money::zero(),
            max_discount: None,
        }
    }

    pub fn with_minimum_order(mut self, minimum: Money) -> Self {
        self.minimum_order = minimum;
        self
    }

    pub fn with_max_discount(mut self, cap: Money) -> Self {
        self.max_discount = Some(cap);
        self
    }

    /// Whether the order is large enough for this promotion to count.
    #[inline]
    pub fn applies_to(&self, subtotal: Money) -> bool {
        subtotal >= self.minimum_order
    }

    /// Savings shown when a code is validated before checkout.
    ///
    /// Free delivery reports the standard delivery fee.
    pub fn discount_preview(&self, subtotal: Money) -> Money {
        discount_amount(&self.discount, self.max_discount, subtotal)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn welcome20(now: DateTime<Utc>) -> Promotion {
        Promotion {
            id: 1,
            title: "Welcome Offer".to_string(),
            description: "Get 20% off your first order".to_string(),
            code: "WELCOME20".to_string(),
            discount: Discount::Percentage(2000),
            minimum_order: Money::from_cents(1500),
            max_discount: Some(Money::from_cents(1000)),
            usage_limit: Some(100),
            usage_count: 25,
            valid_from: now - Duration::days(1),
            valid_until: now + Duration::days(30),
            is_active: true,
            applicable_restaurants: vec![],
            created_at: now,
        }
    }

    #[test]
    fn test_valid_promotion() {
        let now = Utc::now();
        let applied = welcome20(now)
            .check(Money::from_cents(2000), Some(1), now)
            .unwrap();

        assert_eq!(applied.code, "WELCOME20");
        assert_eq!(applied.discount_preview(Money::from_cents(2000)).cents(), 400);
        // Capped at $10
        assert_eq!(applied.discount_preview(Money::from_cents(9000)).cents(), 1000);
    }

    #[test]
    fn test_expired_promotion() {
        let now = Utc::now();
        let mut promo = welcome20(now);
        promo.valid_until = now - Duration::hours(1);

        assert_eq!(
            promo.check(Money::from_cents(2000), None, now),
            Err(PromoRejection::Expired)
        );

        let mut promo = welcome20(now);
        promo.is_active = false;
        assert_eq!(
            promo.check(Money::from_cents(2000), None, now),
            Err(PromoRejection::Expired)
        );
    }

    #[test]
    fn test_usage_limit_checked_before_minimum() {
        let now = Utc::now();
        let mut promo = welcome20(now);
        promo.usage_count = 100;

        assert_eq!(
            promo.check(Money::from_cents(100), None, now),
            Err(PromoRejection::UsageLimitReached)
        );
    }

    #[test]
    fn test_below_minimum() {
        let now = Utc::now();
        let err = welcome20(now)
            .check(Money::from_cents(1499), None, now)
            .unwrap_err();

        assert_eq!(err.to_string(), "Minimum order amount is $15.00");
    }

    #[test]
    fn test_restaurant_restriction() {
        let now = Utc::now();
        let mut promo = welcome20(now);
        promo.applicable_restaurants = vec![2, 3];

        assert_eq!(
            promo.check(Money::from_cents(2000), Some(1), now),
            Err(PromoRejection::NotApplicableToRestaurant)
        );
        assert!(promo.check(Money::from_cents(2000), Some(3), now).is_ok());
        // No restaurant context means the restriction cannot be evaluated yet
        assert!(promo.check(Money::from_cents(2000), None, now).is_ok());
    }

    #[test]
    fn test_free_delivery_preview_is_standard_fee() {
        let applied = AppliedPromo::new("FREESHIP", "Free delivery", Discount::FreeDelivery);
        assert_eq!(applied.discount_preview(Money::from_cents(2500)).cents(), 299);
    }

    #[test]
    fn test_discount_parts() {
        let d = Discount::from_parts(DiscountType::FixedAmount, 500);
        assert_eq!(d, Discount::FixedAmount(Money::from_cents(500)));
        assert_eq!(d.kind(), DiscountType::FixedAmount);
        assert_eq!(d.value(), 500);

        assert_eq!(Discount::from_parts(DiscountType::Percentage, 2000).value(), 2000);
        assert_eq!(Discount::from_parts(DiscountType::FreeDelivery, 99).value(), 0);
    }

    #[test]
    fn test_discount_serializes_flat() {
        let applied = AppliedPromo::new("SAVE5", "Five off", Discount::FixedAmount(Money::from_cents(500)));
        let json = serde_json::to_value(&applied).unwrap();

        assert_eq!(json["discountType"], "fixed_amount");
        assert_eq!(json["discountValue"], 500);
        assert_eq!(json["minimumOrder"], 0);
    }
}
