//! `/api/admin`: back-office endpoints. Every handler takes [`AdminUser`].

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use foodie_core::validation::{
    slugify, validate_bps, validate_email, validate_name, validate_price_cents,
    validate_promo_code, validate_slug,
};
use foodie_core::{Discount, DiscountType, Money, Restaurant, ValidationError};
use foodie_db::{DashboardStats, NewPromotion, OrderFilter, RestaurantInput};

use crate::auth::AdminUser;
use crate::error::{ApiError, ApiResult};
use crate::routes::orders::{list_page, ListOrdersQuery, OrderList};
use crate::state::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/restaurants", post(create_restaurant))
        .route(
            "/restaurants/{id}",
            put(update_restaurant).delete(deactivate_restaurant),
        )
        .route("/orders", get(list_all_orders))
        .route("/stats", get(stats))
        .route("/promotions", post(create_promotion))
}

// =============================================================================
// Restaurants
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRestaurantRequest {
    pub name: String,
    /// Derived from the name when omitted.
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    pub cuisine: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub address: String,
    /// Cents
    pub delivery_fee: i64,
    /// Cents
    #[serde(default)]
    pub minimum_order: i64,
    pub delivery_time_min: i64,
    pub delivery_time_max: i64,
    #[serde(default = "default_true")]
    pub is_open: bool,
    #[serde(default)]
    pub is_featured: bool,
}

fn default_true() -> bool {
    true
}

/// Any field left out keeps its current value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRestaurantRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub cuisine: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub image_url: Option<String>,
    pub address: Option<String>,
    pub delivery_fee: Option<i64>,
    pub minimum_order: Option<i64>,
    pub delivery_time_min: Option<i64>,
    pub delivery_time_max: Option<i64>,
    pub is_open: Option<bool>,
    pub is_featured: Option<bool>,
}

fn validate_restaurant(input: &RestaurantInput) -> Result<(), ValidationError> {
    validate_name("name", &input.name)?;
    validate_slug(&input.slug)?;
    validate_name("cuisine", &input.cuisine)?;
    validate_name("phone", &input.phone)?;
    validate_name("address", &input.address)?;
    if let Some(email) = &input.email {
        validate_email(email)?;
    }
    validate_price_cents(input.delivery_fee.cents())?;
    validate_price_cents(input.minimum_order.cents())?;

    if input.delivery_time_min <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "deliveryTimeMin".to_string(),
        });
    }

    if input.delivery_time_max < input.delivery_time_min {
        return Err(ValidationError::OutOfRange {
            field: "deliveryTimeMax".to_string(),
            min: input.delivery_time_min,
            max: i64::MAX,
        });
    }

    Ok(())
}

async fn create_restaurant(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    Json(body): Json<CreateRestaurantRequest>,
) -> ApiResult<(StatusCode, Json<Restaurant>)> {
    let slug = match body.slug {
        Some(slug) => slug.trim().to_string(),
        None => slugify(&body.name),
    };

    let input = RestaurantInput {
        name: body.name.trim().to_string(),
        slug,
        description: body.description,
        cuisine: body.cuisine.trim().to_string(),
        phone: body.phone.trim().to_string(),
        email: body.email,
        image_url: body.image_url,
        address: body.address.trim().to_string(),
        delivery_fee: Money::from_cents(body.delivery_fee),
        minimum_order: Money::from_cents(body.minimum_order),
        delivery_time_min: body.delivery_time_min,
        delivery_time_max: body.delivery_time_max,
        is_open: body.is_open,
        is_featured: body.is_featured,
    };
    validate_restaurant(&input)?;

    let restaurant = state.db.restaurants().insert(&input).await?;

    info!(admin = %admin.user_id, restaurant_id = restaurant.id, slug = %restaurant.slug, "Restaurant created");
    Ok((StatusCode::CREATED, Json(restaurant)))
}

async fn update_restaurant(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateRestaurantRequest>,
) -> ApiResult<Json<Restaurant>> {
    let current = state
        .db
        .restaurants()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Restaurant"))?;

    let mut input = RestaurantInput::from(&current);
    if let Some(name) = body.name {
        input.name = name.trim().to_string();
    }
    if let Some(slug) = body.slug {
        input.slug = slug.trim().to_string();
    }
    if let Some(description) = body.description {
        input.description = description;
    }
    if let Some(cuisine) = body.cuisine {
        input.cuisine = cuisine.trim().to_string();
    }
    if let Some(phone) = body.phone {
        input.phone = phone.trim().to_string();
    }
    if let Some(address) = body.address {
        input.address = address.trim().to_string();
    }
    input.email = body.email.or(input.email);
    input.image_url = body.image_url.or(input.image_url);
    if let Some(fee) = body.delivery_fee {
        input.delivery_fee = Money::from_cents(fee);
    }
    if let Some(minimum) = body.minimum_order {
        input.minimum_order = Money::from_cents(minimum);
    }
    input.delivery_time_min = body.delivery_time_min.unwrap_or(input.delivery_time_min);
    input.delivery_time_max = body.delivery_time_max.unwrap_or(input.delivery_time_max);
    input.is_open = body.is_open.unwrap_or(input.is_open);
    input.is_featured = body.is_featured.unwrap_or(input.is_featured);

    validate_restaurant(&input)?;

    let restaurant = state.db.restaurants().update(id, &input).await?;

    info!(admin = %admin.user_id, restaurant_id = id, "Restaurant updated");
    Ok(Json(restaurant))
}

/// Soft delete: the restaurant and its order history stay in the database.
async fn deactivate_restaurant(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    state.db.restaurants().set_active(id, false).await?;

    info!(admin = %admin.user_id, restaurant_id = id, "Restaurant deactivated");
    Ok(Json(json!({ "message": "Restaurant deactivated" })))
}

// =============================================================================
// Orders & Stats
// =============================================================================

async fn list_all_orders(
    State(state): State<SharedState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<ListOrdersQuery>,
) -> ApiResult<Json<OrderList>> {
    let pagination = query.pagination()?;

    list_page(
        &state,
        OrderFilter {
            user_id: query.user_id,
            status: query.status,
            restaurant_id: query.restaurant_id,
            pagination,
        },
    )
    .await
}

async fn stats(
    State(state): State<SharedState>,
    AdminUser(_admin): AdminUser,
) -> ApiResult<Json<DashboardStats>> {
    Ok(Json(state.db.stats().dashboard(Utc::now()).await?))
}

// =============================================================================
// Promotions
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePromotionRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub code: String,
    pub discount_type: DiscountType,
    /// Basis points for percentage, cents for fixed amount, ignored for free delivery.
    #[serde(default)]
    pub discount_value: i64,
    /// Cents
    #[serde(default)]
    pub minimum_order: i64,
    /// Cents
    #[serde(default)]
    pub max_discount: Option<i64>,
    #[serde(default)]
    pub usage_limit: Option<i64>,
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub applicable_restaurants: Vec<i64>,
}

impl CreatePromotionRequest {
    fn into_new_promotion(self, now: DateTime<Utc>) -> ApiResult<NewPromotion> {
        validate_name("title", &self.title)?;
        let code = validate_promo_code(&self.code)?;

        match self.discount_type {
            DiscountType::Percentage => validate_bps("discountValue", self.discount_value)?,
            DiscountType::FixedAmount if self.discount_value <= 0 => {
                return Err(ValidationError::MustBePositive {
                    field: "discountValue".to_string(),
                }
                .into());
            }
            DiscountType::FixedAmount | DiscountType::FreeDelivery => {}
        }

        validate_price_cents(self.minimum_order)?;
        if let Some(cap) = self.max_discount {
            validate_price_cents(cap)?;
        }

        if matches!(self.usage_limit, Some(limit) if limit <= 0) {
            return Err(ValidationError::MustBePositive {
                field: "usageLimit".to_string(),
            }
            .into());
        }

        let valid_from = self.valid_from.unwrap_or(now);
        if self.valid_until <= valid_from {
            return Err(ApiError::BadRequest(
                "validUntil must be after validFrom".to_string(),
            ));
        }

        Ok(NewPromotion {
            title: self.title.trim().to_string(),
            description: self.description,
            code,
            discount: Discount::from_parts(self.discount_type, self.discount_value),
            minimum_order: Money::from_cents(self.minimum_order),
            max_discount: self.max_discount.map(Money::from_cents),
            usage_limit: self.usage_limit,
            valid_from,
            valid_until: self.valid_until,
            is_active: self.is_active,
            applicable_restaurants: self.applicable_restaurants,
        })
    }
}

async fn create_promotion(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    Json(body): Json<CreatePromotionRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let promotion = state
        .db
        .promotions()
        .insert(&body.into_new_promotion(Utc::now())?)
        .await?;

    info!(admin = %admin.user_id, code = %promotion.code, "Promotion created");
    Ok((StatusCode::CREATED, Json(json!({ "promotion": promotion }))))
}
