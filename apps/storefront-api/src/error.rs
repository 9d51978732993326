//! Error types for the Storefront API.
//!
//! Every handler returns `Result<_, ApiError>`. Errors from the lower layers
//! convert with `?` and leave as `{"error": <code>, "message": <text>}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use foodie_core::{CoreError, PromoRejection, ValidationError};
use foodie_db::DbError;

/// Storefront API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Promo(#[from] PromoRejection),

    #[error("{0}")]
    AuthFailed(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Well-formed request refused by a business rule.
    #[error("{0}")]
    Unprocessable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn not_found(entity: &str) -> Self {
        ApiError::NotFound(format!("{} not found", entity))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) | ApiError::Promo(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::AuthFailed(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for the `error` field.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Validation(_) => "validation_error",
            ApiError::Promo(_) => "invalid_promo",
            ApiError::AuthFailed(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Unprocessable(_) => "unprocessable",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Validation(e) => ApiError::Validation(e),
            CoreError::Promo(rejection) => ApiError::Promo(rejection),
            e @ (CoreError::MixedRestaurants { .. }
            | CoreError::ItemNotInCart(_)
            | CoreError::CartTooLarge { .. }
            | CoreError::QuantityTooLarge { .. }
            | CoreError::EmptyCart) => ApiError::BadRequest(e.to_string()),
            e @ (CoreError::InvalidStatusTransition { .. }
            | CoreError::RestaurantClosed
            | CoreError::BelowRestaurantMinimum { .. }
            | CoreError::ItemUnavailable(_)) => ApiError::Unprocessable(e.to_string()),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(error: DbError) -> Self {
        match error {
            DbError::NotFound { entity, .. } => ApiError::not_found(&entity),
            e @ DbError::UniqueViolation { .. } => ApiError::Conflict(e.to_string()),
            DbError::ForeignKeyViolation { .. } => {
                ApiError::BadRequest("Referenced record does not exist".to_string())
            }
            DbError::Conflict(msg) => ApiError::Conflict(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            ApiError::Internal(detail) => {
                error!(error = %detail, "Request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (
            status,
            Json(json!({
                "error": self.code(),
                "message": message,
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foodie_core::{Money, OrderStatus};

    #[test]
    fn test_core_error_status_mapping() {
        let err: ApiError = CoreError::MixedRestaurants {
            cart_restaurant: 1,
            item_restaurant: 2,
        }
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: ApiError = CoreError::InvalidStatusTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Preparing,
        }
        .into();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let err: ApiError = CoreError::BelowRestaurantMinimum {
            minimum: Money::from_cents(1000),
        }
        .into();
        assert_eq!(err.code(), "unprocessable");

        let err: ApiError = CoreError::Promo(PromoRejection::UsageLimitReached).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Promo code usage limit exceeded");
    }

    #[test]
    fn test_db_error_status_mapping() {
        let err: ApiError = DbError::not_found("Restaurant", 7).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Restaurant not found");

        let err: ApiError = DbError::duplicate("email", "john@example.com").into();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err: ApiError = DbError::Query("disk I/O error".to_string()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_internal_detail_not_leaked() {
        let response = ApiError::Internal("secret detail".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
