//! # Cart
//!
//! The shopping cart: lines, an optional promo code, and the pricing policy
//! of the restaurant being ordered from.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Action                   Method                  State Change          │
//! │  ──────                   ──────                  ────────────          │
//! │                                                                         │
//! │  Add dish ───────────────► add_item() ──────────► push or merge qty     │
//! │                                                                         │
//! │  Change quantity ────────► update_quantity() ───► set qty (≤0 removes)  │
//! │                                                                         │
//! │  Remove dish ────────────► remove_item() ───────► items.remove(i)       │
//! │                                                                         │
//! │  Enter promo ────────────► apply_promo() ───────► applied_promo = Some  │
//! │                                                                         │
//! │  Clear ──────────────────► clear() ─────────────► items + promo gone    │
//! │                                                                         │
//! │  View totals ────────────► totals() ────────────► (derived, read only)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Totals are never stored. Every read-out goes through
//! [`price_order`](crate::pricing::price_order) so the cart cannot drift
//! from what checkout will charge.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::pricing::{price_order, OrderTotals, PricingPolicy};
use crate::promotion::AppliedPromo;
use crate::types::MenuItem;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// A line in the cart.
///
/// ## Design Notes
/// Name and price are copied from the menu item when added, so the cart
/// keeps displaying what the customer saw even if the menu changes.
/// Checkout re-prices from the database anyway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub menu_item_id: i64,
    pub restaurant_id: i64,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub image_url: Option<String>,
    pub special_instructions: Option<String>,
}

impl CartItem {
    /// Creates a cart line from a menu item.
    pub fn from_menu_item(item: &MenuItem, quantity: i64) -> Self {
        CartItem {
            menu_item_id: item.id,
            restaurant_id: item.restaurant_id,
            name: item.name.clone(),
            unit_price: item.price,
            quantity,
            image_url: item.image_url.clone(),
            special_instructions: None,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.special_instructions = Some(instructions.into());
        self
    }

    /// Unit price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by `menu_item_id` (adding the same dish merges quantity)
/// - Every line has quantity in `1..=MAX_ITEM_QUANTITY`
/// - Every line belongs to the same restaurant
/// - At most `MAX_CART_ITEMS` lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub applied_promo: Option<AppliedPromo>,
    pub pricing: PricingPolicy,
}

impl Cart {
    /// Creates an empty cart priced with the standard policy.
    pub fn new() -> Self {
        Cart::default()
    }

    /// Creates an empty cart with a specific restaurant's pricing.
    pub fn with_pricing(pricing: PricingPolicy) -> Self {
        Cart {
            pricing,
            ..Cart::default()
        }
    }

    /// Adds a line, or increases the quantity if the dish is already there.
    ///
    /// ## Errors
    /// - [`CoreError::QuantityTooLarge`] if the merged quantity passes the cap
    /// - [`CoreError::MixedRestaurants`] if the cart holds another restaurant's dishes
    /// - [`CoreError::CartTooLarge`] if a new line would pass the line cap
    pub fn add_item(&mut self, item: CartItem) -> CoreResult<()> {
        if item.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.menu_item_id == item.menu_item_id)
        {
            let new_qty = existing.quantity + item.quantity;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            existing.quantity = new_qty;
            return Ok(());
        }

        if let Some(cart_restaurant) = self.restaurant_id() {
            if cart_restaurant != item.restaurant_id {
                return Err(CoreError::MixedRestaurants {
                    cart_restaurant,
                    item_restaurant: item.restaurant_id,
                });
            }
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge { max: MAX_CART_ITEMS });
        }

        if item.quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: item.quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        self.items.push(item);
        Ok(())
    }

    /// Sets a line's quantity. Zero or less removes the line.
    pub fn update_quantity(&mut self, menu_item_id: i64, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return self.remove_item(menu_item_id);
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        match self.items.iter_mut().find(|i| i.menu_item_id == menu_item_id) {
            Some(item) => {
                item.quantity = quantity;
                Ok(())
            }
            None => Err(CoreError::ItemNotInCart(menu_item_id)),
        }
    }

    /// Removes a line by menu item id.
    pub fn remove_item(&mut self, menu_item_id: i64) -> CoreResult<()> {
        let before = self.items.len();
        self.items.retain(|i| i.menu_item_id != menu_item_id);

        if self.items.len() == before {
            return Err(CoreError::ItemNotInCart(menu_item_id));
        }
        Ok(())
    }

    /// Attaches a promotion, replacing any previous one.
    ///
    /// Eligibility is checked by [`Promotion::check`](crate::promotion::Promotion::check)
    /// before this is called; the minimum order is re-evaluated on every read.
    pub fn apply_promo(&mut self, promo: AppliedPromo) {
        self.applied_promo = Some(promo);
    }

    pub fn remove_promo(&mut self) {
        self.applied_promo = None;
    }

    /// Empties the cart and drops the promotion.
    pub fn clear(&mut self) {
        self.items.clear();
        self.applied_promo = None;
    }

    // -------------------------------------------------------------------------
    // Read-outs
    // -------------------------------------------------------------------------

    /// Restaurant every line belongs to, if any.
    pub fn restaurant_id(&self) -> Option<i64> {
        self.items.first().map(|i| i.restaurant_id)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines.
    #[inline]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of quantities, the number shown on the cart badge.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn subtotal(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Full price breakdown.
    pub fn totals(&self) -> OrderTotals {
        price_order(self.subtotal(), &self.pricing, self.applied_promo.as_ref())
    }

    pub fn delivery_fee(&self) -> Money {
        self.totals().delivery_fee
    }

    pub fn discount(&self) -> Money {
        self.totals().discount
    }

    pub fn tax(&self) -> Money {
        self.totals().tax
    }

    pub fn total(&self) -> Money {
        self.totals().total
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::promotion::Discount;

    fn line(menu_item_id: i64, restaurant_id: i64, price: i64, qty: i64) -> CartItem {
        CartItem {
            menu_item_id,
            restaurant_id,
            name: format!("Dish {menu_item_id}"),
            unit_price: Money::from_cents(price),
            quantity: qty,
            image_url: None,
            special_instructions: None,
        }
    }

    #[test]
    fn test_add_merges_quantity() {
        let mut cart = Cart::new();
        cart.add_item(line(1, 1, 899, 1)).unwrap();
        cart.add_item(line(1, 1, 899, 2)).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 3);
        assert_eq!(cart.subtotal().cents(), 2697);
    }

    #[test]
    fn test_mixed_restaurants_rejected() {
        let mut cart = Cart::new();
        cart.add_item(line(1, 1, 899, 1)).unwrap();

        let err = cart.add_item(line(10, 2, 1299, 1)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::MixedRestaurants {
                cart_restaurant: 1,
                item_restaurant: 2
            }
        ));
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_quantity_cap() {
        let mut cart = Cart::new();
        cart.add_item(line(1, 1, 100, 98)).unwrap();

        assert!(matches!(
            cart.add_item(line(1, 1, 100, 2)),
            Err(CoreError::QuantityTooLarge { requested: 100, .. })
        ));
        assert!(cart.update_quantity(1, 100).is_err());
        assert_eq!(cart.total_quantity(), 98);
    }

    #[test]
    fn test_line_cap() {
        let mut cart = Cart::new();
        for id in 0..MAX_CART_ITEMS as i64 {
            cart.add_item(line(id, 1, 100, 1)).unwrap();
        }

        assert!(matches!(
            cart.add_item(line(999, 1, 100, 1)),
            Err(CoreError::CartTooLarge { .. })
        ));
        // Merging into an existing line is still fine
        assert!(cart.add_item(line(0, 1, 100, 1)).is_ok());
    }

    #[test]
    fn test_update_zero_removes() {
        let mut cart = Cart::new();
        cart.add_item(line(1, 1, 899, 2)).unwrap();
        cart.add_item(line(2, 1, 1299, 1)).unwrap();

        cart.update_quantity(1, 0).unwrap();
        assert_eq!(cart.item_count(), 1);

        cart.update_quantity(2, -3).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.restaurant_id(), None);
    }

    #[test]
    fn test_unknown_item() {
        let mut cart = Cart::new();
        assert!(matches!(cart.remove_item(7), Err(CoreError::ItemNotInCart(7))));
        assert!(matches!(
            cart.update_quantity(7, 2),
            Err(CoreError::ItemNotInCart(7))
        ));
    }

    #[test]
    fn test_clear_drops_promo() {
        let mut cart = Cart::new();
        cart.add_item(line(1, 1, 2000, 1)).unwrap();
        cart.apply_promo(AppliedPromo::new("FREESHIP", "Free delivery", Discount::FreeDelivery));
        assert!(cart.delivery_fee().is_zero());

        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.applied_promo.is_none());
    }

    #[test]
    fn test_totals_follow_pricing_policy() {
        let policy = PricingPolicy::standard().with_delivery_fee(Money::from_cents(399));
        let mut cart = Cart::with_pricing(policy);
        cart.add_item(line(1, 2, 1699, 1)).unwrap();
        cart.add_item(line(2, 2, 899, 2)).unwrap();

        // 16.99 + 17.98 = 34.97
        assert_eq!(cart.subtotal().cents(), 3497);
        assert_eq!(cart.delivery_fee().cents(), 399);
        assert_eq!(cart.tax().cents(), 280);
        assert_eq!(cart.total().cents(), 3497 + 399 + 280);
    }

    #[test]
    fn test_promo_reevaluated_against_minimum() {
        let mut cart = Cart::new();
        cart.add_item(line(1, 1, 1000, 2)).unwrap();
        cart.apply_promo(
            AppliedPromo::new("WELCOME20", "Welcome", Discount::Percentage(2000))
                .with_minimum_order(Money::from_cents(1500))
                .with_max_discount(Money::from_cents(1000)),
        );
        assert_eq!(cart.discount().cents(), 400);

        // Dropping below the minimum turns the promotion off
        cart.update_quantity(1, 1).unwrap();
        assert!(cart.discount().is_zero());

        cart.remove_promo();
        assert!(cart.applied_promo.is_none());
    }

    #[test]
    fn test_non_positive_add_rejected() {
        let mut cart = Cart::new();
        assert!(matches!(
            cart.add_item(line(1, 1, 100, 0)),
            Err(CoreError::Validation(_))
        ));
    }
}
