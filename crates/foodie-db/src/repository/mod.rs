//! # Repository Module
//!
//! Database repository implementations for the storefront.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  axum handler                                                          │
//! │       │                                                                 │
//! │       │  db.restaurants().list(&filter)                                │
//! │       ▼                                                                 │
//! │  RestaurantRepository                                                  │
//! │  ├── list(&self, filter)                                               │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── insert(&self, input)                                              │
//! │  └── update(&self, id, input)                                          │
//! │       │                                                                 │
//! │       │  SQL Query → FromRow row struct → foodie-core type             │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each repository keeps a private `*Row` struct that mirrors the table
//! columns (cents as `i64`, flags as `bool`, JSON lists as `Json<Vec<_>>`)
//! and converts into the domain type with `From`.
//!
//! ## Available Repositories
//!
//! - [`restaurant::RestaurantRepository`] - Restaurant listing, CRUD, rating refresh
//! - [`menu::MenuRepository`] - Menu categories and items
//! - [`order::OrderRepository`] - Checkout persistence and status history
//! - [`promotion::PromotionRepository`] - Promo codes and usage counting
//! - [`review::ReviewRepository`] - Reviews with author names
//! - [`user::UserRepository`] - Stored accounts
//! - [`stats::StatsRepository`] - Admin dashboard aggregates

pub mod menu;
pub mod order;
pub mod promotion;
pub mod restaurant;
pub mod review;
pub mod stats;
pub mod user;
