//! # Money Module
//!
//! Integer-cent money for every price, fee, discount and total in the
//! storefront.
//!
//! ## Why Not f64?
//! Menu prices like $8.99 are not exactly representable in binary floating
//! point. Summing a cart of them and taking 8% tax drifts by fractions of a
//! cent, and the drift shows up as a total that disagrees with the receipt.
//! All arithmetic here is on `i64` cents; only the display layer formats
//! dollars.
//!
//! ## Money Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  MenuItem.price_cents ──► CartItem.unit_price ──► line total            │
//! │                                                                         │
//! │  Σ line totals ──► subtotal ──┬──► tax (bps, half-up)                   │
//! │                               ├──► discount (promotion)                 │
//! │                               └──► total = subtotal + fee + tax − disc  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::pricing::TaxRate;

/// A monetary amount stored as cents.
///
/// Serializes as a bare integer (`1099`), which is what the JSON API and the
/// database both carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use foodie_core::money::Money;
    ///
    /// let price = Money::from_cents(1699); // $16.99
    /// assert_eq!(price.cents(), 1699);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-dollar portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Clamps negative amounts to zero.
    ///
    /// ## Example
    /// ```rust
    /// use foodie_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(-120).clamp_non_negative(), Money::zero());
    /// assert_eq!(Money::from_cents(450).clamp_non_negative().cents(), 450);
    /// ```
    #[inline]
    pub const fn clamp_non_negative(self) -> Money {
        if self.0 < 0 {
            Money(0)
        } else {
            self
        }
    }

    /// Takes a basis-point share of this amount, rounding half up.
    ///
    /// ## Implementation
    /// `(cents × bps + 5000) / 10000` in i128 so large carts cannot overflow.
    ///
    /// ## Example
    /// ```rust
    /// use foodie_core::money::Money;
    ///
    /// // 20% of $34.97 = $6.994 → $6.99
    /// assert_eq!(Money::from_cents(3497).percentage(2000).cents(), 699);
    /// ```
    pub fn percentage(&self, bps: u32) -> Money {
        let cents = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money::from_cents(cents as i64)
    }

    /// Calculates tax at the given rate.
    ///
    /// ## Example
    /// ```rust
    /// use foodie_core::money::Money;
    /// use foodie_core::pricing::TaxRate;
    ///
    /// // $34.97 at 8% = $2.7976 → $2.80
    /// let tax = Money::from_cents(3497).calculate_tax(TaxRate::from_bps(800));
    /// assert_eq!(tax.cents(), 280);
    /// ```
    #[inline]
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        self.percentage(rate.bps())
    }

    /// Multiplies a unit price by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly `$12.34` formatting. Localized display belongs to the frontend.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
