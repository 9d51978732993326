//! Menu writes (admin only).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use foodie_core::validation::{validate_name, validate_price_cents};
use foodie_core::{Money, ValidationError};
use foodie_db::{NewMenuCategory, NewMenuItem};

use crate::auth::AdminUser;
use crate::error::{ApiError, ApiResult};
use crate::state::SharedState;

const DEFAULT_PREPARATION_MINUTES: i64 = 15;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/menu-items", post(create_menu_item))
        .route("/menu-items/{id}/availability", put(set_availability))
        .route("/menu-categories", post(create_category))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMenuItemRequest {
    pub restaurant_id: i64,
    pub category_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Cents
    pub price: i64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_popular: bool,
    #[serde(default)]
    pub preparation_time: Option<i64>,
    #[serde(default)]
    pub calories: Option<i64>,
    #[serde(default)]
    pub allergens: Vec<String>,
    #[serde(default)]
    pub dietary_tags: Vec<String>,
    #[serde(default)]
    pub sort_order: i64,
}

async fn create_menu_item(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    Json(body): Json<CreateMenuItemRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    validate_name("name", &body.name)?;
    validate_price_cents(body.price)?;

    let preparation_time = body.preparation_time.unwrap_or(DEFAULT_PREPARATION_MINUTES);
    if preparation_time <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "preparationTime".to_string(),
        }
        .into());
    }

    state
        .db
        .restaurants()
        .get_by_id(body.restaurant_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Restaurant"))?;

    let item = state
        .db
        .menus()
        .insert_item(&NewMenuItem {
            restaurant_id: body.restaurant_id,
            category_id: body.category_id,
            name: body.name.trim().to_string(),
            description: body.description.trim().to_string(),
            price: Money::from_cents(body.price),
            image_url: body.image_url,
            is_popular: body.is_popular,
            dietary_tags: body.dietary_tags,
            allergens: body.allergens,
            calories: body.calories,
            preparation_time,
            sort_order: body.sort_order,
        })
        .await?;

    info!(admin = %admin.user_id, menu_item_id = item.id, "Menu item created");
    Ok((StatusCode::CREATED, Json(json!({ "menuItem": item }))))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest {
    pub is_available: bool,
}

async fn set_availability(
    State(state): State<SharedState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<i64>,
    Json(body): Json<AvailabilityRequest>,
) -> ApiResult<Json<Value>> {
    state.db.menus().set_item_available(id, body.is_available).await?;

    let item = state
        .db
        .menus()
        .get_item(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Menu item"))?;

    Ok(Json(json!({ "menuItem": item })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub restaurant_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: i64,
}

async fn create_category(
    State(state): State<SharedState>,
    AdminUser(_admin): AdminUser,
    Json(body): Json<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    validate_name("name", &body.name)?;

    let category = state
        .db
        .menus()
        .insert_category(&NewMenuCategory {
            restaurant_id: body.restaurant_id,
            name: body.name.trim().to_string(),
            description: body.description,
            sort_order: body.sort_order,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "category": category }))))
}
