//! # foodie-core: Pure Storefront Logic
//!
//! Everything the storefront needs to decide *what an order costs* and
//! *whether a request makes sense*, with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Foodie Storefront                                │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              storefront-api (axum JSON handlers)                │   │
//! │  │   restaurants, menu, cart quote, checkout, promotions, admin    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ foodie-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   types   money   cart   pricing   promotion   order   review  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  foodie-db (SQLite repositories)                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Restaurants, menus, users, reviews
//! - [`money`] - Integer-cent money type
//! - [`pricing`] - Subtotal, delivery fee, discount, tax, total
//! - [`promotion`] - Promo codes and their eligibility rules
//! - [`cart`] - The cart state container
//! - [`order`] - Order status lifecycle and order numbering
//! - [`review`] - Review helpers (ratings, relative dates)
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use foodie_core::money::Money;
//! use foodie_core::pricing::{price_order, PricingPolicy};
//!
//! let totals = price_order(Money::from_cents(2000), &PricingPolicy::standard(), None);
//!
//! // $20.00 + $2.99 delivery + $1.60 tax
//! assert_eq!(totals.total.cents(), 2459);
//! ```

pub mod cart;
pub mod error;
pub mod money;
pub mod order;
pub mod pricing;
pub mod promotion;
pub mod review;
pub mod types;
pub mod validation;

pub use cart::{Cart, CartItem};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use order::{DeliveryAddress, Order, OrderDetail, OrderItem, OrderStatus, PaymentMethod};
pub use pricing::{OrderTotals, PricingPolicy, TaxRate};
pub use promotion::{AppliedPromo, Discount, DiscountType, PromoRejection, Promotion};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines in a single cart.
pub const MAX_CART_ITEMS: usize = 50;

/// Maximum quantity of a single menu item in a cart.
pub const MAX_ITEM_QUANTITY: i64 = 99;

/// Delivery fee charged when neither the restaurant nor a promotion says otherwise.
pub const STANDARD_DELIVERY_FEE_CENTS: i64 = 299;

/// Sales tax applied to the food subtotal (800 bps = 8%).
pub const DEFAULT_TAX_RATE_BPS: u32 = 800;

/// Fallback delivery estimate in minutes.
pub const DEFAULT_DELIVERY_MINUTES: i64 = 45;
