//! # Orders
//!
//! Order records and the status lifecycle.
//!
//! ## Status Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  pending ─► confirmed ─► preparing ─► ready ─► out_for_delivery ─►      │
//! │     │           │            │          │              │   delivered    │
//! │     │           │            │          │              │                │
//! │     └───────────┴────────────┴──────────┴──────────────┴──► cancelled   │
//! │                                                                         │
//! │  Forward moves may skip steps. Nothing moves backward.                  │
//! │  delivered and cancelled are terminal.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Checkout creates orders directly in `confirmed`: payment is recorded, not
//! charged, so there is no separate authorization step.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::pricing::OrderTotals;
use crate::types::RestaurantSummary;
use crate::DEFAULT_DELIVERY_MINUTES;

// =============================================================================
// Order Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Position on the forward chain. `None` for cancelled.
    fn step(&self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Confirmed => Some(1),
            OrderStatus::Preparing => Some(2),
            OrderStatus::Ready => Some(3),
            OrderStatus::OutForDelivery => Some(4),
            OrderStatus::Delivered => Some(5),
            OrderStatus::Cancelled => None,
        }
    }

    /// Whether an order in this status may move to `next`.
    ///
    /// ## Example
    /// ```rust
    /// use foodie_core::OrderStatus;
    ///
    /// assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Ready));
    /// assert!(OrderStatus::Preparing.can_transition_to(OrderStatus::Cancelled));
    /// assert!(!OrderStatus::Ready.can_transition_to(OrderStatus::Preparing));
    /// assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
    /// ```
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }

        match (self.step(), next.step()) {
            (_, None) => true,
            (Some(current), Some(target)) => target > current,
            (None, Some(_)) => false,
        }
    }

    /// Checks a transition, returning the typed error on refusal.
    pub fn transition_to(&self, next: OrderStatus) -> CoreResult<OrderStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidStatusTransition {
                from: *self,
                to: next,
            })
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: OrderStatus::ALL.iter().map(|s| s.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer says they will pay. Recorded, never charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentMethod {
    Card,
    Cash,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Card
    }
}

// =============================================================================
// Delivery Address
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DeliveryAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
}

impl DeliveryAddress {
    /// Checks that every required line is filled in.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("zipCode", &self.zip_code),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ValidationError::Required {
                    field: field.to_string(),
                });
            }
        }

        Ok(())
    }
}

// =============================================================================
// Order
// =============================================================================

/// A placed order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Order {
    pub id: i64,
    /// Customer-facing number, `ORD-<unix millis>`.
    pub order_number: String,
    pub user_id: Option<String>,
    pub restaurant_id: i64,
    pub status: OrderStatus,
    #[serde(flatten)]
    #[ts(flatten)]
    pub totals: OrderTotals,
    pub promo_code: Option<String>,
    pub delivery_address: DeliveryAddress,
    pub payment_method: PaymentMethod,
    #[ts(as = "String")]
    pub estimated_delivery_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub delivered_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Whether `user_id` placed this order.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id.as_deref() == Some(user_id)
    }
}

/// A line on a placed order.
///
/// Name and price are frozen at checkout so later menu edits do not
/// rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub menu_item_id: i64,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub line_total: Money,
    pub special_instructions: Option<String>,
}

/// One row of an order's status history.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderStatusEntry {
    pub id: i64,
    pub order_id: i64,
    pub status: OrderStatus,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Everything the order tracking page shows.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderDetail {
    #[serde(flatten)]
    #[ts(flatten)]
    pub order: Order,
    pub restaurant: RestaurantSummary,
    pub items: Vec<OrderItem>,
    pub status_history: Vec<OrderStatusEntry>,
}

// =============================================================================
// Numbering and Estimates
// =============================================================================

/// Builds the customer-facing order number.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use foodie_core::order::generate_order_number;
///
/// let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
/// assert_eq!(generate_order_number(now), "ORD-1700000000123");
/// ```
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    order_number_from_millis(now.timestamp_millis())
}

pub fn order_number_from_millis(millis: i64) -> String {
    format!("ORD-{}", millis)
}

/// The millisecond stamp inside an order number, if it has one.
pub fn order_number_millis(order_number: &str) -> Option<i64> {
    order_number.strip_prefix("ORD-")?.parse().ok()
}

/// Delivery estimate from the restaurant's upper delivery time.
pub fn estimated_delivery(created_at: DateTime<Utc>, delivery_time_max: Option<i64>) -> DateTime<Utc> {
    let minutes = delivery_time_max
        .filter(|m| *m > 0)
        .unwrap_or(DEFAULT_DELIVERY_MINUTES);
    created_at + Duration::minutes(minutes)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_forward_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Preparing));
        assert!(OrderStatus::OutForDelivery.can_transition_to(OrderStatus::Delivered));
        // Skipping ahead is fine
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn test_backward_and_same_rejected() {
        assert!(!OrderStatus::Ready.can_transition_to(OrderStatus::Confirmed));
        assert!(!OrderStatus::Preparing.can_transition_to(OrderStatus::Preparing));
        assert!(!OrderStatus::Confirmed.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_terminal_statuses() {
        for next in OrderStatus::ALL {
            assert!(!OrderStatus::Delivered.can_transition_to(next));
            assert!(!OrderStatus::Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn test_cancel_from_any_open_status() {
        for status in OrderStatus::ALL.into_iter().filter(|s| !s.is_terminal()) {
            assert!(status.can_transition_to(OrderStatus::Cancelled), "{status}");
        }
    }

    #[test]
    fn test_transition_error() {
        let err = OrderStatus::Delivered
            .transition_to(OrderStatus::Cancelled)
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidStatusTransition { .. }));
    }

    #[test]
    fn test_status_parse_and_display() {
        assert_eq!("out_for_delivery".parse::<OrderStatus>().unwrap(), OrderStatus::OutForDelivery);
        assert_eq!(OrderStatus::OutForDelivery.to_string(), "out_for_delivery");
        assert!("shipped".parse::<OrderStatus>().is_err());

        let json = serde_json::to_string(&OrderStatus::OutForDelivery).unwrap();
        assert_eq!(json, "\"out_for_delivery\"");
    }

    #[test]
    fn test_estimated_delivery() {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        assert_eq!(
            estimated_delivery(created, Some(35)),
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 35, 0).unwrap()
        );
        assert_eq!(
            estimated_delivery(created, None),
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 45, 0).unwrap()
        );
    }

    #[test]
    fn test_order_number_millis() {
        assert_eq!(order_number_millis("ORD-1700000000123"), Some(1_700_000_000_123));
        assert_eq!(order_number_millis(&order_number_from_millis(42)), Some(42));
        assert_eq!(order_number_millis("INV-1"), None);
    }

    #[test]
    fn test_address_validation() {
        let mut address = DeliveryAddress {
            street: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            zip_code: "62701".to_string(),
            country: None,
            instructions: None,
        };
        assert!(address.validate().is_ok());

        address.city = "  ".to_string();
        assert_eq!(address.validate().unwrap_err().field(), "city");
    }
}
