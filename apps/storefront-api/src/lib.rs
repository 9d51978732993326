//! # Storefront API
//!
//! JSON REST server for the Foodie storefront.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Storefront API                                  │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  Auth          │  │  Catalog       │  │  Checkout                  ││
//! │  │                │  │                │  │                            ││
//! │  │ • register     │  │ • restaurants  │  │ • cart quote               ││
//! │  │ • login        │  │ • menus        │  │ • place order              ││
//! │  │ • refresh / me │  │ • reviews      │  │ • promo validation         ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐                                │
//! │  │  Orders        │  │  Admin         │                                │
//! │  │                │  │                │                                │
//! │  │ • history      │  │ • restaurants  │                                │
//! │  │ • tracking     │  │ • orders/stats │                                │
//! │  │ • status moves │  │ • promotions   │                                │
//! │  └────────────────┘  └────────────────┘                                │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Infrastructure                               │  │
//! │  │                                                                   │  │
//! │  │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────────┐│  │
//! │  │  │  SQLite      │  │  Accounts    │  │    JWT Auth              ││  │
//! │  │  │  (foodie-db) │  │  db or mock  │  │                          ││  │
//! │  │  │              │  │              │  │ Access + refresh tokens  ││  │
//! │  │  └──────────────┘  └──────────────┘  └──────────────────────────┘│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! `storefront.toml` or environment variables:
//! - `FOODIE_PORT` - HTTP port (default: 3000)
//! - `FOODIE_DATABASE_PATH` - SQLite file (default: ./foodie.db)
//! - `FOODIE_JWT_SECRET` - Secret for JWT signing
//! - `FOODIE_JWT_ACCESS_LIFETIME_SECS` - Access token lifetime (default: 3600)
//! - `FOODIE_JWT_REFRESH_LIFETIME_SECS` - Refresh token lifetime (default: 604800)
//! - `FOODIE_AUTH_BACKEND` - `auto`, `database` or `mock`
//! - `FOODIE_TAX_RATE_BPS` - Sales tax (default: 800)
//! - `FOODIE_CORS_ORIGIN` - Allowed browser origin

pub mod accounts;
pub mod auth;
pub mod checkout;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

// Re-exports
pub use config::ApiConfig;
pub use error::ApiError;
pub use state::{AppState, SharedState};

/// The full application: routes, request tracing and CORS.
pub fn build_router(state: SharedState) -> Router {
    let cors = cors_layer(state.config.cors_origin.as_deref());

    routes::router()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    match origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => layer.allow_origin(origin),
        Some(Err(_)) => {
            warn!("Ignoring unparsable cors_origin, allowing any origin");
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}
