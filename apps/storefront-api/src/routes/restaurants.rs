//! Public restaurant browsing plus review writing.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use foodie_core::review::time_ago;
use foodie_core::validation::{
    validate_comment, validate_pagination, validate_rating, validate_search_query,
};
use foodie_core::{MenuSection, Pagination, Restaurant, Review};
use foodie_db::{NewReview, RestaurantFilter};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::routes::PageMeta;
use crate::state::{AppState, SharedState};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/restaurants", get(list_restaurants))
        .route("/restaurants/{id}", get(get_restaurant))
        .route("/restaurants/{id}/menu", get(get_menu))
        .route(
            "/restaurants/{id}/reviews",
            get(list_reviews).post(create_review),
        )
        .route("/reviews/{id}/helpful", post(mark_helpful))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRestaurantsQuery {
    pub search: Option<String>,
    /// Comma-separated, e.g. `Italian,Thai`.
    pub cuisine: Option<String>,
    pub min_rating: Option<f64>,
    pub featured: Option<bool>,
    pub is_open: Option<bool>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ListRestaurantsQuery {
    fn into_filter(self) -> ApiResult<RestaurantFilter> {
        let search = match self.search.as_deref() {
            Some(raw) => Some(validate_search_query(raw)?).filter(|s| !s.is_empty()),
            None => None,
        };

        let cuisines = self
            .cuisine
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"))
            .map(str::to_string)
            .collect();

        if let Some(rating) = self.min_rating {
            if !(0.0..=5.0).contains(&rating) {
                return Err(ApiError::BadRequest(
                    "minRating must be between 0 and 5".to_string(),
                ));
            }
        }

        Ok(RestaurantFilter {
            search,
            cuisines,
            min_rating: self.min_rating,
            featured: self.featured,
            is_open: self.is_open,
            include_inactive: false,
            pagination: validate_pagination(self.page, self.limit, 12)?,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct RestaurantList {
    pub restaurants: Vec<Restaurant>,
    #[serde(flatten)]
    pub meta: PageMeta,
}

async fn list_restaurants(
    State(state): State<SharedState>,
    Query(query): Query<ListRestaurantsQuery>,
) -> ApiResult<Json<RestaurantList>> {
    let filter = query.into_filter()?;
    let page = state.db.restaurants().list(&filter).await?;
    let meta = PageMeta::from(&page);

    Ok(Json(RestaurantList {
        restaurants: page.items,
        meta,
    }))
}

/// Resolves `{id}` as a numeric id or a slug. Inactive restaurants are hidden.
pub(crate) async fn find_restaurant(state: &AppState, key: &str) -> ApiResult<Restaurant> {
    let repo = state.db.restaurants();
    let found = match key.parse::<i64>() {
        Ok(id) => repo.get_by_id(id).await?,
        Err(_) => repo.get_by_slug(key).await?,
    };

    found
        .filter(|r| r.is_active)
        .ok_or_else(|| ApiError::not_found("Restaurant"))
}

async fn get_restaurant(
    State(state): State<SharedState>,
    Path(key): Path<String>,
) -> ApiResult<Json<Restaurant>> {
    Ok(Json(find_restaurant(&state, &key).await?))
}

#[derive(Debug, Serialize)]
pub struct MenuResponse {
    pub categories: Vec<MenuSection>,
}

async fn get_menu(
    State(state): State<SharedState>,
    Path(key): Path<String>,
) -> ApiResult<Json<MenuResponse>> {
    let restaurant = find_restaurant(&state, &key).await?;
    let categories = state.db.menus().menu_for_restaurant(restaurant.id).await?;

    Ok(Json(MenuResponse { categories }))
}

// =============================================================================
// Reviews
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    pub fn pagination(&self) -> ApiResult<Pagination> {
        Ok(validate_pagination(self.page, self.limit, Pagination::DEFAULT_LIMIT)?)
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewAuthor {
    pub name: String,
    pub avatar: Option<String>,
}

/// A review as the restaurant page renders it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub id: i64,
    pub user: ReviewAuthor,
    pub rating: i64,
    pub comment: String,
    pub helpful: i64,
    /// "3 days ago"
    pub date: String,
    pub created_at: String,
}

impl ReviewView {
    fn new(review: Review, now: chrono::DateTime<Utc>) -> Self {
        ReviewView {
            id: review.id,
            user: ReviewAuthor {
                name: review.author_name,
                avatar: review.author_avatar,
            },
            rating: review.rating,
            comment: review.comment,
            helpful: review.helpful_count,
            date: time_ago(review.created_at, now),
            created_at: review.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewList {
    pub reviews: Vec<ReviewView>,
    #[serde(flatten)]
    pub meta: PageMeta,
}

async fn list_reviews(
    State(state): State<SharedState>,
    Path(key): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<ReviewList>> {
    let restaurant = find_restaurant(&state, &key).await?;
    let page = state
        .db
        .reviews()
        .list_for_restaurant(restaurant.id, query.pagination()?)
        .await?;

    let meta = PageMeta::from(&page);
    let now = Utc::now();

    Ok(Json(ReviewList {
        reviews: page
            .items
            .into_iter()
            .map(|review| ReviewView::new(review, now))
            .collect(),
        meta,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    #[serde(default)]
    pub order_id: Option<i64>,
    pub rating: i64,
    pub comment: String,
}

async fn create_review(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(key): Path<String>,
    Json(body): Json<CreateReviewRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    validate_rating(body.rating)?;
    validate_comment(&body.comment)?;

    let restaurant = find_restaurant(&state, &key).await?;

    if let Some(order_id) = body.order_id {
        let order = state
            .db
            .orders()
            .get(order_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Order"))?;

        if !order.is_owned_by(&auth.user_id) {
            return Err(ApiError::Forbidden(
                "You can only review your own orders".to_string(),
            ));
        }

        if order.restaurant_id != restaurant.id {
            return Err(ApiError::BadRequest(
                "Order is from a different restaurant".to_string(),
            ));
        }

        if state
            .db
            .reviews()
            .exists_for_order(&auth.user_id, order_id)
            .await?
        {
            return Err(ApiError::BadRequest(
                "You have already reviewed this order".to_string(),
            ));
        }
    }

    let author_name = state
        .accounts
        .find_user(&auth.user_id)
        .await?
        .map(|user| user.display_name())
        .unwrap_or_else(|| auth.email.clone());

    let review = state
        .db
        .reviews()
        .insert(&NewReview {
            user_id: auth.user_id,
            author_name,
            restaurant_id: restaurant.id,
            order_id: body.order_id,
            rating: body.rating,
            comment: body.comment.trim().to_string(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "review": review }))))
}

async fn mark_helpful(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let helpful_count = state.db.reviews().mark_helpful(id).await?;
    Ok(Json(json!({ "id": id, "helpfulCount": helpful_count })))
}
