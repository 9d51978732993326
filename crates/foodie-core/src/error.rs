//! # Error Types
//!
//! Domain-specific error types for foodie-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  foodie-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                        │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  foodie-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                     │
//! │                                                                         │
//! │  storefront-api errors                                                  │
//! │  └── ApiError         - What HTTP clients see ({error, message})        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → JSON body              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;
use crate::order::OrderStatus;
use crate::promotion::PromoRejection;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by cart, pricing and order logic.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Cart already holds items from another restaurant.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart: [Bella Italia × 2]
    ///      │
    ///      ▼
    /// add_item(Sushi Master roll)
    ///      │
    ///      ▼
    /// MixedRestaurants { cart_restaurant: 1, item_restaurant: 2 }
    ///      │
    ///      ▼
    /// UI asks: "Start a new cart?"
    /// ```
    #[error("Cart holds items from restaurant {cart_restaurant}; cannot add items from restaurant {item_restaurant}")]
    MixedRestaurants {
        cart_restaurant: i64,
        item_restaurant: i64,
    },

    #[error("Menu item {0} is not in the cart")]
    ItemNotInCart(i64),

    /// Cart has reached the maximum number of lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    #[error("Cart is empty")]
    EmptyCart,

    /// Requested status change breaks the order lifecycle.
    #[error("Cannot move order from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error("Restaurant is currently closed")]
    RestaurantClosed,

    #[error("Minimum order for this restaurant is {minimum}")]
    BelowRestaurantMinimum { minimum: Money },

    #[error("Menu item {0} is not available")]
    ItemUnavailable(i64),

    /// Promo code was refused.
    #[error(transparent)]
    Promo(#[from] PromoRejection),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when request input doesn't meet requirements.
/// Handlers run validation before touching the database.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed email, bad slug).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., email already registered).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooShort { field, .. }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. }
            | ValidationError::Duplicate { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::MixedRestaurants {
            cart_restaurant: 1,
            item_restaurant: 2,
        };
        assert_eq!(
            err.to_string(),
            "Cart holds items from restaurant 1; cannot add items from restaurant 2"
        );

        let err = CoreError::InvalidStatusTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Preparing,
        };
        assert_eq!(err.to_string(), "Cannot move order from delivered to preparing");

        let err = CoreError::BelowRestaurantMinimum {
            minimum: Money::from_cents(1500),
        };
        assert_eq!(err.to_string(), "Minimum order for this restaurant is $15.00");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "email".to_string(),
        };
        assert_eq!(err.to_string(), "email is required");
        assert_eq!(err.field(), "email");

        let err = ValidationError::TooShort {
            field: "password".to_string(),
            min: 6,
        };
        assert_eq!(err.to_string(), "password must be at least 6 characters");
    }

    #[test]
    fn test_promo_rejection_is_transparent() {
        let err: CoreError = PromoRejection::Expired.into();
        assert_eq!(err.to_string(), "Invalid or expired promo code");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
