//! HTTP routes, one file per area.
//!
//! ```text
//! /health                                   health
//! /api/auth/{register,login,refresh,me,logout}
//! /api/restaurants[/{id}[/menu|/reviews]]   restaurants
//! /api/reviews/{id}/helpful                 restaurants
//! /api/menu-items                           menu (admin)
//! /api/cart/quote                           cart
//! /api/orders[/{id}]                        orders
//! /api/promotions[/validate]                promotions
//! /api/admin/...                            admin
//! ```

use axum::routing::get;
use axum::Router;
use serde::Serialize;

use foodie_core::Page;

use crate::state::SharedState;

pub mod admin;
pub mod auth;
pub mod cart;
pub mod health;
pub mod menu;
pub mod orders;
pub mod promotions;
pub mod restaurants;

/// Every route, before middleware.
pub fn router() -> Router<SharedState> {
    let api = Router::new()
        .nest("/auth", auth::router())
        .merge(restaurants::router())
        .merge(menu::router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/promotions", promotions::router())
        .nest("/admin", admin::router());

    Router::new()
        .route("/health", get(health::health))
        .nest("/api", api)
}

/// `total`, `page`, `limit`, `totalPages` beside a named item list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl<T> From<&Page<T>> for PageMeta {
    fn from(page: &Page<T>) -> Self {
        PageMeta {
            total: page.total,
            page: page.page,
            limit: page.limit,
            total_pages: page.total_pages(),
        }
    }
}
