//! # Domain Types
//!
//! Core domain types used throughout the storefront.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Restaurant    │   │  MenuCategory   │   │    MenuItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64)       │◄──│  restaurant_id  │◄──│  category_id    │       │
//! │  │  slug (unique)  │   │  sort_order     │   │  price (cents)  │       │
//! │  │  delivery_fee   │   └─────────────────┘   │  is_available   │       │
//! │  │  minimum_order  │                         └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │      User       │   │     Review      │                             │
//! │  │  ─────────────  │   │  ─────────────  │                             │
//! │  │  id (UUID)      │◄──│  user_id        │                             │
//! │  │  role           │   │  rating (1-5)   │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Orders live in [`crate::order`], promotions in [`crate::promotion`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::pricing::{PricingPolicy, TaxRate};

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum UserRole {
    User,
    Admin,
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::User
    }
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }

    /// Parses a stored role. Anything unknown is treated as a plain user.
    pub fn parse(s: &str) -> Self {
        match s {
            "admin" => UserRole::Admin,
            _ => UserRole::User,
        }
    }
}

/// A storefront account as the API shows it. The password hash never
/// leaves the database layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    /// Unique identifier (UUID v4).
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub role: UserRole,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl User {
    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// "First Last", falling back to the username.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

// =============================================================================
// Restaurants
// =============================================================================

/// A restaurant listed on the storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    /// URL-safe unique name, e.g. `bella-italia`.
    pub slug: String,
    pub description: String,
    pub cuisine: String,
    pub phone: String,
    pub email: Option<String>,
    pub image_url: Option<String>,
    pub address: String,
    /// Average review rating, 0-5 with one decimal.
    pub rating: f64,
    pub review_count: i64,
    pub delivery_fee: Money,
    pub minimum_order: Money,
    /// Delivery window in minutes.
    pub delivery_time_min: i64,
    pub delivery_time_max: i64,
    pub is_open: bool,
    pub is_featured: bool,
    /// Soft-delete flag. Inactive restaurants disappear from listings.
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Restaurant {
    /// "25-35 min"
    pub fn delivery_time_label(&self) -> String {
        format!("{}-{} min", self.delivery_time_min, self.delivery_time_max)
    }

    /// Pricing inputs for an order from this restaurant.
    pub fn pricing_policy(&self, tax_rate: TaxRate) -> PricingPolicy {
        PricingPolicy::standard()
            .with_delivery_fee(self.delivery_fee)
            .with_tax_rate(tax_rate)
    }

    /// Whether a cart subtotal meets this restaurant's minimum.
    #[inline]
    pub fn accepts_subtotal(&self, subtotal: Money) -> bool {
        subtotal >= self.minimum_order
    }

    pub fn summary(&self) -> RestaurantSummary {
        RestaurantSummary {
            id: self.id,
            name: self.name.clone(),
            slug: self.slug.clone(),
            image_url: self.image_url.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// The restaurant fields embedded in an order detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RestaurantSummary {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub phone: String,
}

// =============================================================================
// Menu
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MenuCategory {
    pub id: i64,
    pub restaurant_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i64,
}

/// A dish on a restaurant's menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MenuItem {
    pub id: i64,
    pub restaurant_id: i64,
    pub category_id: i64,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub image_url: Option<String>,
    pub is_popular: bool,
    pub is_available: bool,
    /// e.g. `vegetarian`, `gluten-free`.
    pub dietary_tags: Vec<String>,
    pub allergens: Vec<String>,
    pub calories: Option<i64>,
    /// Minutes.
    pub preparation_time: i64,
    pub sort_order: i64,
}

/// One category of a menu with its items, as the menu page renders it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MenuSection {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub items: Vec<MenuItem>,
}

// =============================================================================
// Reviews
// =============================================================================

/// A customer review, joined with the author's display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Review {
    pub id: i64,
    pub user_id: String,
    pub restaurant_id: i64,
    pub order_id: Option<i64>,
    pub rating: i64,
    pub comment: String,
    pub helpful_count: i64,
    pub author_name: String,
    pub author_avatar: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Pagination
// =============================================================================

/// Page/limit pair after validation. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    pub const DEFAULT_LIMIT: i64 = 10;

    pub fn new(page: i64, limit: i64) -> Self {
        Pagination { page, limit }
    }

    #[inline]
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// One page of a listing plus the total row count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: Pagination) -> Self {
        Page {
            items,
            total,
            page: pagination.page,
            limit: pagination.limit,
        }
    }

    /// `ceil(total / limit)`
    pub fn total_pages(&self) -> i64 {
        if self.limit <= 0 {
            return 0;
        }
        (self.total + self.limit - 1) / self.limit
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn restaurant() -> Restaurant {
        let now = Utc::now();
        Restaurant {
            id: 1,
            name: "Bella Italia".to_string(),
            slug: "bella-italia".to_string(),
            description: "Authentic Italian cuisine".to_string(),
            cuisine: "Italian".to_string(),
            phone: "(555) 123-4567".to_string(),
            email: None,
            image_url: None,
            address: "123 Main St".to_string(),
            rating: 4.8,
            review_count: 324,
            delivery_fee: Money::from_cents(299),
            minimum_order: Money::from_cents(1500),
            delivery_time_min: 25,
            delivery_time_max: 35,
            is_open: true,
            is_featured: true,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_restaurant_helpers() {
        let r = restaurant();
        assert_eq!(r.delivery_time_label(), "25-35 min");
        assert!(r.accepts_subtotal(Money::from_cents(1500)));
        assert!(!r.accepts_subtotal(Money::from_cents(1499)));

        let policy = r.pricing_policy(TaxRate::from_bps(800));
        assert_eq!(policy.delivery_fee.cents(), 299);
        assert_eq!(r.summary().slug, "bella-italia");
    }

    #[test]
    fn test_user_role_serde() {
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), "\"admin\"");
        assert_eq!(UserRole::parse("admin"), UserRole::Admin);
        assert_eq!(UserRole::parse("owner"), UserRole::User);
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let mut user = User {
            id: "u1".to_string(),
            username: "johndoe".to_string(),
            email: "john@example.com".to_string(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            phone: None,
            avatar_url: None,
            role: UserRole::User,
            created_at: Utc::now(),
        };
        assert_eq!(user.display_name(), "John Doe");

        user.first_name.clear();
        user.last_name.clear();
        assert_eq!(user.display_name(), "johndoe");
    }

    #[test]
    fn test_page_math() {
        let page = Page::new(vec![1, 2, 3], 21, Pagination::new(1, 10));
        assert_eq!(page.total_pages(), 3);
        assert_eq!(Pagination::new(3, 10).offset(), 20);

        let mapped = page.map(|n| n * 2);
        assert_eq!(mapped.items, vec![2, 4, 6]);
    }

    #[test]
    fn test_restaurant_serializes_camel_case() {
        let json = serde_json::to_value(restaurant()).unwrap();
        assert_eq!(json["deliveryFee"], 299);
        assert_eq!(json["minimumOrder"], 1500);
        assert_eq!(json["isFeatured"], true);
    }
}
