//! # Promotion Repository
//!
//! Promo codes. Codes are unique and matched case-insensitively (the column
//! is `COLLATE NOCASE`). Eligibility rules live in
//! [`foodie_core::Promotion::check`]; this module only stores and counts.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use foodie_core::{Discount, DiscountType, Money, Promotion};

/// Fields for a new promotion. Usage starts at zero.
#[derive(Debug, Clone)]
pub struct NewPromotion {
    pub title: String,
    pub description: String,
    pub code: String,
    pub discount: Discount,
    pub minimum_order: Money,
    pub max_discount: Option<Money>,
    pub usage_limit: Option<i64>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub is_active: bool,
    pub applicable_restaurants: Vec<i64>,
}

#[derive(Debug, sqlx::FromRow)]
struct PromotionRow {
    id: i64,
    title: String,
    description: String,
    code: String,
    discount_type: DiscountType,
    discount_value: i64,
    minimum_order_cents: i64,
    max_discount_cents: Option<i64>,
    usage_limit: Option<i64>,
    usage_count: i64,
    valid_from: DateTime<Utc>,
    valid_until: DateTime<Utc>,
    is_active: bool,
    applicable_restaurants: Json<Vec<i64>>,
    created_at: DateTime<Utc>,
}

impl From<PromotionRow> for Promotion {
    fn from(row: PromotionRow) -> Self {
        Promotion {
            id: row.id,
            title: row.title,
            description: row.description,
            code: row.code,
            discount: Discount::from_parts(row.discount_type, row.discount_value),
            minimum_order: Money::from_cents(row.minimum_order_cents),
            max_discount: row.max_discount_cents.map(Money::from_cents),
            usage_limit: row.usage_limit,
            usage_count: row.usage_count,
            valid_from: row.valid_from,
            valid_until: row.valid_until,
            is_active: row.is_active,
            applicable_restaurants: row.applicable_restaurants.0,
            created_at: row.created_at,
        }
    }
}

const PROMOTION_COLUMNS: &str = "id, title, description, code, discount_type, discount_value, \
     minimum_order_cents, max_discount_cents, usage_limit, usage_count, valid_from, valid_until, \
     is_active, applicable_restaurants, created_at";

/// Repository for promotion database operations.
#[derive(Debug, Clone)]
pub struct PromotionRepository {
    pool: SqlitePool,
}

impl PromotionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PromotionRepository { pool }
    }

    /// Newest first. With `active_only`, only active promotions whose
    /// validity window contains `now`.
    pub async fn list(&self, active_only: bool, now: DateTime<Utc>) -> DbResult<Vec<Promotion>> {
        let mut query =
            QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM promotions", PROMOTION_COLUMNS));
        if active_only {
            query
                .push(" WHERE is_active = 1 AND valid_from <= ")
                .push_bind(now)
                .push(" AND valid_until >= ")
                .push_bind(now);
        }
        query.push(" ORDER BY created_at DESC, id DESC");

        let rows: Vec<PromotionRow> = query.build_query_as().fetch_all(&self.pool).await?;

        Ok(rows.into_iter().map(Promotion::from).collect())
    }

    /// Case-insensitive lookup.
    pub async fn find_by_code(&self, code: &str) -> DbResult<Option<Promotion>> {
        let row = sqlx::query_as::<_, PromotionRow>(&format!(
            "SELECT {} FROM promotions WHERE code = ?1",
            PROMOTION_COLUMNS
        ))
        .bind(code.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Promotion::from))
    }

    /// Inserts a promotion. The code is stored upper-cased.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` when the code already exists in any case.
    pub async fn insert(&self, promo: &NewPromotion) -> DbResult<Promotion> {
        let code = promo.code.trim().to_ascii_uppercase();

        let id = sqlx::query(
            r#"
            INSERT INTO promotions (
                title, description, code, discount_type, discount_value,
                minimum_order_cents, max_discount_cents, usage_limit, usage_count,
                valid_from, valid_until, is_active, applicable_restaurants, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&promo.title)
        .bind(&promo.description)
        .bind(&code)
        .bind(promo.discount.kind())
        .bind(promo.discount.value())
        .bind(promo.minimum_order.cents())
        .bind(promo.max_discount.map(|m| m.cents()))
        .bind(promo.usage_limit)
        .bind(promo.valid_from)
        .bind(promo.valid_until)
        .bind(promo.is_active)
        .bind(Json(&promo.applicable_restaurants))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("code", code.clone()),
            other => other,
        })?
        .last_insert_rowid();

        debug!(id, code = %code, "Promotion inserted");

        self.find_by_code(&code)
            .await?
            .ok_or_else(|| DbError::not_found("Promotion", id))
    }

    /// Counts one use of a code. Returns `false` when the code is unknown or
    /// already at its usage limit.
    pub async fn increment_usage(&self, code: &str) -> DbResult<bool> {
        let mut conn = self.pool.acquire().await?;
        increment_usage_in(&mut conn, code).await
    }
}

/// Usage increment on an existing connection, so checkout can count the use
/// inside its own transaction.
pub(crate) async fn increment_usage_in(conn: &mut SqliteConnection, code: &str) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE promotions
        SET usage_count = usage_count + 1
        WHERE code = ?1 AND (usage_limit IS NULL OR usage_count < usage_limit)
        "#,
    )
    .bind(code.trim())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::test_db;
    use chrono::Duration;

    fn welcome(now: DateTime<Utc>) -> NewPromotion {
        NewPromotion {
            title: "Welcome Offer".to_string(),
            description: "Get 20% off your first order".to_string(),
            code: "welcome20".to_string(),
            discount: Discount::Percentage(2000),
            minimum_order: Money::from_cents(1500),
            max_discount: Some(Money::from_cents(1000)),
            usage_limit: Some(2),
            valid_from: now - Duration::days(1),
            valid_until: now + Duration::days(30),
            is_active: true,
            applicable_restaurants: vec![1, 3],
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_case_insensitive() {
        let db = test_db().await;
        let repo = db.promotions();
        let now = Utc::now();

        let promo = repo.insert(&welcome(now)).await.unwrap();
        assert_eq!(promo.code, "WELCOME20");
        assert_eq!(promo.discount, Discount::Percentage(2000));
        assert_eq!(promo.max_discount, Some(Money::from_cents(1000)));
        assert_eq!(promo.applicable_restaurants, vec![1, 3]);
        assert_eq!(promo.usage_count, 0);

        let found = repo.find_by_code("Welcome20").await.unwrap().unwrap();
        assert_eq!(found.id, promo.id);
        assert!(repo.find_by_code("NOPE").await.unwrap().is_none());

        let err = repo.insert(&welcome(now)).await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_active_listing() {
        let db = test_db().await;
        let repo = db.promotions();
        let now = Utc::now();

        repo.insert(&welcome(now)).await.unwrap();

        let mut expired = welcome(now);
        expired.code = "OLD10".to_string();
        expired.valid_until = now - Duration::hours(1);
        repo.insert(&expired).await.unwrap();

        let mut disabled = welcome(now);
        disabled.code = "OFF".to_string();
        disabled.is_active = false;
        repo.insert(&disabled).await.unwrap();

        assert_eq!(repo.list(false, now).await.unwrap().len(), 3);

        let active = repo.list(true, now).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].code, "WELCOME20");
    }

    #[tokio::test]
    async fn test_increment_usage_respects_limit() {
        let db = test_db().await;
        let repo = db.promotions();
        repo.insert(&welcome(Utc::now())).await.unwrap();

        assert!(repo.increment_usage("welcome20").await.unwrap());
        assert!(repo.increment_usage("WELCOME20").await.unwrap());
        assert!(!repo.increment_usage("WELCOME20").await.unwrap());
        assert!(!repo.increment_usage("MISSING").await.unwrap());

        let promo = repo.find_by_code("WELCOME20").await.unwrap().unwrap();
        assert_eq!(promo.usage_count, 2);
        assert!(promo.usage_exhausted());
    }
}
