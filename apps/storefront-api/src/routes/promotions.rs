//! `/api/promotions`: listing and code validation.

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use foodie_core::{Discount, Money, Promotion, ValidationError};

use crate::checkout::find_promotion;
use crate::error::{ApiError, ApiResult};
use crate::state::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_promotions))
        .route("/validate", post(validate_code))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListPromotionsQuery {
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct PromotionList {
    pub promotions: Vec<Promotion>,
}

async fn list_promotions(
    State(state): State<SharedState>,
    Query(query): Query<ListPromotionsQuery>,
) -> ApiResult<Json<PromotionList>> {
    let promotions = state.db.promotions().list(query.active, Utc::now()).await?;
    Ok(Json(PromotionList { promotions }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    pub code: String,
    /// Food subtotal in cents
    pub order_total: i64,
    #[serde(default)]
    pub restaurant_id: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedPromotion {
    pub code: String,
    pub title: String,
    #[serde(flatten)]
    pub discount: Discount,
    /// What the customer saves. Free delivery reports the standard fee.
    pub discount_amount: Money,
    pub min_order: Money,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub promotion: ValidatedPromotion,
}

/// Runs the same checks checkout will. Any refusal is a 400 with the reason.
async fn validate_code(
    State(state): State<SharedState>,
    Json(body): Json<ValidateRequest>,
) -> ApiResult<Json<ValidateResponse>> {
    if body.code.trim().is_empty() || body.order_total == 0 {
        return Err(ApiError::BadRequest(
            "Code and order total are required".to_string(),
        ));
    }
    if body.order_total < 0 {
        return Err(ValidationError::MustBePositive {
            field: "orderTotal".to_string(),
        }
        .into());
    }

    let subtotal = Money::from_cents(body.order_total);
    let promotion = find_promotion(&state, &body.code).await?;
    let applied = promotion.check(subtotal, body.restaurant_id, Utc::now())?;

    Ok(Json(ValidateResponse {
        valid: true,
        promotion: ValidatedPromotion {
            discount_amount: applied.discount_preview(subtotal),
            code: applied.code,
            title: applied.title,
            discount: applied.discount,
            min_order: applied.minimum_order,
        },
    }))
}
