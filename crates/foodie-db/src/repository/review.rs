//! # Review Repository
//!
//! Customer reviews. Writing a review refreshes the restaurant's rating and
//! review count in the same transaction.
//!
//! The author's name comes from `users` when the account is stored there and
//! falls back to the `author_name` snapshot taken at write time (accounts
//! from the in-process mock table never reach `users`).

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::restaurant::refresh_rating_in;
use foodie_core::{Page, Pagination, Review};

/// Fields for a new review.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub user_id: String,
    /// Display name at the time of writing.
    pub author_name: String,
    pub restaurant_id: i64,
    pub order_id: Option<i64>,
    pub rating: i64,
    pub comment: String,
}

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    user_id: String,
    restaurant_id: i64,
    order_id: Option<i64>,
    rating: i64,
    comment: String,
    helpful_count: i64,
    author_name: String,
    author_avatar: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Review {
            id: row.id,
            user_id: row.user_id,
            restaurant_id: row.restaurant_id,
            order_id: row.order_id,
            rating: row.rating,
            comment: row.comment,
            helpful_count: row.helpful_count,
            author_name: row.author_name,
            author_avatar: row.author_avatar,
            created_at: row.created_at,
        }
    }
}

const REVIEW_SELECT: &str = r#"
    SELECT
        r.id, r.user_id, r.restaurant_id, r.order_id, r.rating, r.comment,
        r.helpful_count, r.created_at,
        COALESCE(NULLIF(TRIM(u.first_name || ' ' || u.last_name), ''), r.author_name) AS author_name,
        u.avatar_url AS author_avatar
    FROM reviews r
    LEFT JOIN users u ON u.id = r.user_id
"#;

/// Repository for review database operations.
#[derive(Debug, Clone)]
pub struct ReviewRepository {
    pool: SqlitePool,
}

impl ReviewRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReviewRepository { pool }
    }

    /// Reviews of one restaurant, newest first.
    pub async fn list_for_restaurant(
        &self,
        restaurant_id: i64,
        pagination: Pagination,
    ) -> DbResult<Page<Review>> {
        let total = self.count_for_restaurant(restaurant_id).await?;

        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            "{} WHERE r.restaurant_id = ?1 ORDER BY r.created_at DESC, r.id DESC LIMIT ?2 OFFSET ?3",
            REVIEW_SELECT
        ))
        .bind(restaurant_id)
        .bind(pagination.limit)
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        debug!(restaurant_id, count = rows.len(), total, "Reviews loaded");
        Ok(Page::new(
            rows.into_iter().map(Review::from).collect(),
            total,
            pagination,
        ))
    }

    pub async fn count_for_restaurant(&self, restaurant_id: i64) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE restaurant_id = ?1")
            .bind(restaurant_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(total)
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<Review>> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!("{} WHERE r.id = ?1", REVIEW_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Review::from))
    }

    /// Whether this user already reviewed this order.
    pub async fn exists_for_order(&self, user_id: &str, order_id: i64) -> DbResult<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT id FROM reviews WHERE user_id = ?1 AND order_id = ?2")
                .bind(user_id)
                .bind(order_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(found.is_some())
    }

    /// Writes a review and refreshes the restaurant rating.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` when the user already reviewed the order.
    pub async fn insert(&self, review: &NewReview) -> DbResult<Review> {
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            r#"
            INSERT INTO reviews (user_id, author_name, restaurant_id, order_id, rating, comment, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&review.user_id)
        .bind(&review.author_name)
        .bind(review.restaurant_id)
        .bind(review.order_id)
        .bind(review.rating)
        .bind(&review.comment)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate(
                "review",
                format!("order {}", review.order_id.unwrap_or_default()),
            ),
            other => other,
        })?
        .last_insert_rowid();

        refresh_rating_in(&mut tx, review.restaurant_id).await?;

        tx.commit().await?;

        info!(
            review_id = id,
            restaurant_id = review.restaurant_id,
            rating = review.rating,
            "Review created"
        );

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Review", id))
    }

    /// Bumps the helpful counter and returns the new value.
    pub async fn mark_helpful(&self, id: i64) -> DbResult<i64> {
        let count: Option<i64> = sqlx::query_scalar(
            "UPDATE reviews SET helpful_count = helpful_count + 1 WHERE id = ?1 RETURNING helpful_count",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        count.ok_or_else(|| DbError::not_found("Review", id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
