//! Server-side cart pricing.
//!
//! Clients send menu item ids and quantities only. Names, prices, the
//! delivery fee and the promotion are all looked up here, so a quote and the
//! order placed from it are priced by the same code.
//!
//! ```text
//! lines ──► load items ──► load restaurant ──► Cart (core) ──► promo check ──► totals
//!              │                 │                 │               │
//!           404 / 422         404 if gone     mixed restaurant   400 on any
//!           unavailable                        / qty limits      rejection
//! ```

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use foodie_core::validation::{validate_line_count, validate_promo_code, validate_quantity};
use foodie_core::{Cart, CartItem, CoreError, OrderTotals, PromoRejection, Promotion, Restaurant};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// One requested cart line.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub menu_item_id: i64,
    pub quantity: i64,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

/// A cart priced against current menu data.
#[derive(Debug, Clone)]
pub struct PricedCart {
    pub restaurant: Restaurant,
    pub cart: Cart,
    pub promotion: Option<Promotion>,
    pub totals: OrderTotals,
}

impl PricedCart {
    /// Refuses carts the restaurant would not accept right now.
    pub fn ensure_orderable(&self) -> Result<(), CoreError> {
        if !self.restaurant.is_open {
            return Err(CoreError::RestaurantClosed);
        }

        if !self.restaurant.accepts_subtotal(self.totals.subtotal) {
            return Err(CoreError::BelowRestaurantMinimum {
                minimum: self.restaurant.minimum_order,
            });
        }

        Ok(())
    }
}

/// Prices `lines` with an optional promo code.
pub async fn price_cart(
    state: &AppState,
    lines: &[CartLine],
    promo_code: Option<&str>,
    now: DateTime<Utc>,
) -> ApiResult<PricedCart> {
    validate_line_count(lines.len())?;
    for line in lines {
        validate_quantity(line.quantity)?;
    }

    let ids: Vec<i64> = lines.iter().map(|l| l.menu_item_id).collect();
    let menu_items = state.db.menus().get_items(&ids).await?;

    let first = menu_items
        .iter()
        .find(|item| item.id == lines[0].menu_item_id)
        .ok_or_else(|| ApiError::not_found("Menu item"))?;

    let restaurant = state
        .db
        .restaurants()
        .get_by_id(first.restaurant_id)
        .await?
        .filter(|r| r.is_active)
        .ok_or_else(|| ApiError::not_found("Restaurant"))?;

    let mut cart = Cart::with_pricing(restaurant.pricing_policy(state.config.tax_rate()));

    for line in lines {
        let item = menu_items
            .iter()
            .find(|item| item.id == line.menu_item_id)
            .ok_or_else(|| ApiError::not_found("Menu item"))?;

        if !item.is_available {
            return Err(CoreError::ItemUnavailable(item.id).into());
        }

        let mut cart_item = CartItem::from_menu_item(item, line.quantity);
        if let Some(instructions) = line.special_instructions.as_deref().map(str::trim) {
            if !instructions.is_empty() {
                cart_item = cart_item.with_instructions(instructions);
            }
        }
        cart.add_item(cart_item)?;
    }

    let promotion = match promo_code.map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => {
            let promotion = find_promotion(state, code).await?;
            let applied = promotion.check(cart.subtotal(), Some(restaurant.id), now)?;
            cart.apply_promo(applied);
            Some(promotion)
        }
        None => None,
    };

    let totals = cart.totals();

    debug!(
        restaurant_id = restaurant.id,
        lines = cart.item_count(),
        subtotal = totals.subtotal.cents(),
        total = totals.total.cents(),
        promo = ?promotion.as_ref().map(|p| &p.code),
        "Cart priced"
    );

    Ok(PricedCart {
        restaurant,
        cart,
        promotion,
        totals,
    })
}

/// Looks a code up; unknown codes read as expired, like every other miss.
pub async fn find_promotion(state: &AppState, code: &str) -> ApiResult<Promotion> {
    let code = validate_promo_code(code).map_err(|_| PromoRejection::Expired)?;

    state
        .db
        .promotions()
        .find_by_code(&code)
        .await?
        .ok_or_else(|| PromoRejection::Expired.into())
}
