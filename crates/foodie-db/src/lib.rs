//! # foodie-db: Database Layer for the Foodie Storefront
//!
//! SQLite storage for restaurants, menus, orders, promotions, reviews and
//! accounts, using sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Storefront Data Flow                               │
//! │                                                                         │
//! │  axum handler (POST /api/orders)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    foodie-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ Restaurant     │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ Menu, Order    │    │ 001_initial  │  │   │
//! │  │   │ Connection    │    │ Promotion      │    │ _schema.sql  │  │   │
//! │  │   │ Management    │    │ Review, User   │    │              │  │   │
//! │  │   │               │    │ Stats          │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (FOODIE_DATABASE_PATH) or :memory: in tests               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`password`] - Argon2 password hashing for stored accounts
//! - [`seed`] - Demo catalog used by the `seed` binary and tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use foodie_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("foodie.db")).await?;
//! let page = db.restaurants().list(&RestaurantFilter::default()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod password;
pub mod pool;
pub mod repository;
pub mod seed;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::menu::{MenuRepository, NewMenuCategory, NewMenuItem};
pub use repository::order::{NewOrder, NewOrderItem, OrderFilter, OrderRepository};
pub use repository::promotion::{NewPromotion, PromotionRepository};
pub use repository::restaurant::{RestaurantFilter, RestaurantInput, RestaurantRepository};
pub use repository::review::{NewReview, ReviewRepository};
pub use repository::stats::{DailyRevenue, DashboardStats, StatsRepository};
pub use repository::user::{NewUser, StoredUser, UserRepository};
