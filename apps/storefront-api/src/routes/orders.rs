//! `/api/orders`: checkout, order history, tracking, status updates.
//!
//! ## Checkout Flow
//! ```text
//! POST /api/orders
//!      │
//!      ├── validate address
//!      ├── price_cart()            re-price from the database
//!      ├── ensure_orderable()      open + minimum order
//!      ├── record payment method   (never charged)
//!      └── orders().create()       order + items + history + promo use,
//!                                  one transaction
//! ```

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use foodie_core::order::estimated_delivery;
use foodie_core::validation::validate_pagination;
use foodie_core::{DeliveryAddress, Order, OrderDetail, OrderStatus, Pagination, PaymentMethod};
use foodie_db::{NewOrder, NewOrderItem, OrderFilter};

use crate::auth::{AdminUser, AuthUser};
use crate::checkout::{price_cart, CartLine};
use crate::error::{ApiError, ApiResult};
use crate::routes::PageMeta;
use crate::state::{AppState, SharedState};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/{id}", get(get_order).put(update_order_status))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<CartLine>,
    pub delivery_address: DeliveryAddress,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub promo_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrderPlaced {
    pub success: bool,
    pub order: OrderDetail,
    pub message: &'static str,
}

async fn create_order(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(body): Json<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<OrderPlaced>)> {
    body.delivery_address.validate()?;

    let now = Utc::now();
    let priced = price_cart(&state, &body.items, body.promo_code.as_deref(), now).await?;
    priced.ensure_orderable()?;

    // Payment is recorded, not processed.
    info!(
        user_id = %auth.user_id,
        payment_method = ?body.payment_method,
        amount = priced.totals.total.cents(),
        "Payment recorded"
    );

    let items = priced
        .cart
        .items
        .iter()
        .map(|item| NewOrderItem {
            menu_item_id: item.menu_item_id,
            name: item.name.clone(),
            unit_price: item.unit_price,
            quantity: item.quantity,
            special_instructions: item.special_instructions.clone(),
        })
        .collect();

    let order = state
        .db
        .orders()
        .create(&NewOrder {
            user_id: Some(auth.user_id.clone()),
            restaurant_id: priced.restaurant.id,
            status: OrderStatus::Confirmed,
            totals: priced.totals,
            promo_code: priced.promotion.as_ref().map(|p| p.code.clone()),
            delivery_address: body.delivery_address,
            payment_method: body.payment_method,
            estimated_delivery_at: estimated_delivery(now, Some(priced.restaurant.delivery_time_max)),
            created_at: now,
            items,
            notes: Some("Order placed".to_string()),
        })
        .await?;

    let detail = load_detail(&state, order.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderPlaced {
            success: true,
            order: detail,
            message: "Order placed successfully",
        }),
    ))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOrdersQuery {
    pub status: Option<OrderStatus>,
    /// Honored for admins only.
    pub user_id: Option<String>,
    pub restaurant_id: Option<i64>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ListOrdersQuery {
    pub fn pagination(&self) -> ApiResult<Pagination> {
        Ok(validate_pagination(self.page, self.limit, Pagination::DEFAULT_LIMIT)?)
    }
}

#[derive(Debug, Serialize)]
pub struct OrderList {
    pub orders: Vec<Order>,
    #[serde(flatten)]
    pub meta: PageMeta,
}

pub(crate) async fn list_page(state: &AppState, filter: OrderFilter) -> ApiResult<Json<OrderList>> {
    let page = state.db.orders().list(&filter).await?;
    let meta = PageMeta::from(&page);

    Ok(Json(OrderList {
        orders: page.items,
        meta,
    }))
}

/// The caller's own orders; admins may look at another user's.
async fn list_orders(
    State(state): State<SharedState>,
    auth: AuthUser,
    Query(query): Query<ListOrdersQuery>,
) -> ApiResult<Json<OrderList>> {
    let pagination = query.pagination()?;

    let user_id = match query.user_id {
        Some(requested) if auth.is_admin() => requested,
        Some(requested) if requested != auth.user_id => {
            return Err(ApiError::Forbidden(
                "You can only list your own orders".to_string(),
            ));
        }
        _ => auth.user_id,
    };

    list_page(
        &state,
        OrderFilter {
            user_id: Some(user_id),
            status: query.status,
            restaurant_id: query.restaurant_id,
            pagination,
        },
    )
    .await
}

async fn load_detail(state: &AppState, id: i64) -> ApiResult<OrderDetail> {
    state
        .db
        .orders()
        .get_detail(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order"))
}

async fn get_order(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<OrderDetail>> {
    let detail = load_detail(&state, id).await?;

    if !auth.is_admin() && !detail.order.is_owned_by(&auth.user_id) {
        return Err(ApiError::Forbidden(
            "You can only view your own orders".to_string(),
        ));
    }

    Ok(Json(detail))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusUpdated {
    pub order: Order,
    pub message: &'static str,
}

/// Moves an order along its lifecycle. Illegal moves are refused with 422.
async fn update_order_status(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateStatusRequest>,
) -> ApiResult<Json<StatusUpdated>> {
    let current = state
        .db
        .orders()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order"))?;

    let next = current.status.transition_to(body.status)?;
    let notes = body
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    let order = state
        .db
        .orders()
        .update_status(id, current.status, next, notes)
        .await?;

    info!(admin = %admin.user_id, order_id = id, status = %next, "Order status changed");

    Ok(Json(StatusUpdated {
        order,
        message: "Order status updated successfully",
    }))
}
