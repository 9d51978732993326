//! `/api/cart/quote`: price a cart without placing it.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use foodie_core::{AppliedPromo, CartItem, Money, OrderTotals};

use crate::checkout::{price_cart, CartLine, PricedCart};
use crate::error::ApiResult;
use crate::state::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new().route("/quote", post(quote))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub promo_code: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteLine {
    #[serde(flatten)]
    pub item: CartItem,
    pub line_total: Money,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub restaurant_id: i64,
    pub items: Vec<QuoteLine>,
    #[serde(flatten)]
    pub totals: OrderTotals,
    pub promotion: Option<AppliedPromo>,
    pub restaurant_open: bool,
    pub minimum_order: Money,
    pub meets_minimum: bool,
}

impl From<PricedCart> for QuoteResponse {
    fn from(priced: PricedCart) -> Self {
        let restaurant = priced.restaurant;
        QuoteResponse {
            restaurant_id: restaurant.id,
            meets_minimum: restaurant.accepts_subtotal(priced.totals.subtotal),
            restaurant_open: restaurant.is_open,
            minimum_order: restaurant.minimum_order,
            promotion: priced.cart.applied_promo.clone(),
            items: priced
                .cart
                .items
                .into_iter()
                .map(|item| QuoteLine {
                    line_total: item.line_total(),
                    item,
                })
                .collect(),
            totals: priced.totals,
        }
    }
}

/// Anyone may ask; the result is never stored.
async fn quote(
    State(state): State<SharedState>,
    Json(body): Json<QuoteRequest>,
) -> ApiResult<Json<QuoteResponse>> {
    let priced = price_cart(&state, &body.items, body.promo_code.as_deref(), Utc::now()).await?;
    Ok(Json(QuoteResponse::from(priced)))
}
