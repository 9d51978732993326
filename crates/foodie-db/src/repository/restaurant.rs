//! # Restaurant Repository
//!
//! Database operations for restaurants.
//!
//! ## Listing Filters
//! ```text
//! GET /api/restaurants?search=pi&cuisine=Italian,Thai&minRating=4.5&featured=true
//!       │
//!       ▼
//! RestaurantFilter
//!   search     → LOWER(name) LIKE '%pi%' OR LOWER(cuisine) LIKE '%pi%'
//!   cuisines   → LOWER(cuisine) IN ('italian', 'thai')
//!   min_rating → rating >= 4.5
//!   featured   → is_featured = 1
//!   is_open    → is_open = ?
//!   (always)   → is_active = 1
//!       │
//!       ▼
//! ORDER BY id, LIMIT/OFFSET from Pagination + COUNT(*) for the total
//! ```

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use foodie_core::{Money, Page, Pagination, Restaurant};

/// Restaurant listing filter.
#[derive(Debug, Clone, Default)]
pub struct RestaurantFilter {
    /// Case-insensitive substring of the name or cuisine.
    pub search: Option<String>,
    /// Any of these cuisines (case-insensitive). Empty means all.
    pub cuisines: Vec<String>,
    pub min_rating: Option<f64>,
    pub featured: Option<bool>,
    pub is_open: Option<bool>,
    /// Admin listings also show deactivated restaurants.
    pub include_inactive: bool,
    pub pagination: Pagination,
}

/// Editable restaurant fields, used by both create and update.
#[derive(Debug, Clone)]
pub struct RestaurantInput {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub cuisine: String,
    pub phone: String,
    pub email: Option<String>,
    pub image_url: Option<String>,
    pub address: String,
    pub delivery_fee: Money,
    pub minimum_order: Money,
    pub delivery_time_min: i64,
    pub delivery_time_max: i64,
    pub is_open: bool,
    pub is_featured: bool,
}

impl From<&Restaurant> for RestaurantInput {
    fn from(r: &Restaurant) -> Self {
        RestaurantInput {
            name: r.name.clone(),
            slug: r.slug.clone(),
            description: r.description.clone(),
            cuisine: r.cuisine.clone(),
            phone: r.phone.clone(),
            email: r.email.clone(),
            image_url: r.image_url.clone(),
            address: r.address.clone(),
            delivery_fee: r.delivery_fee,
            minimum_order: r.minimum_order,
            delivery_time_min: r.delivery_time_min,
            delivery_time_max: r.delivery_time_max,
            is_open: r.is_open,
            is_featured: r.is_featured,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RestaurantRow {
    id: i64,
    name: String,
    slug: String,
    description: String,
    cuisine: String,
    phone: String,
    email: Option<String>,
    image_url: Option<String>,
    address: String,
    rating: f64,
    review_count: i64,
    delivery_fee_cents: i64,
    minimum_order_cents: i64,
    delivery_time_min: i64,
    delivery_time_max: i64,
    is_open: bool,
    is_featured: bool,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RestaurantRow> for Restaurant {
    fn from(row: RestaurantRow) -> Self {
        Restaurant {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            cuisine: row.cuisine,
            phone: row.phone,
            email: row.email,
            image_url: row.image_url,
            address: row.address,
            rating: row.rating,
            review_count: row.review_count,
            delivery_fee: Money::from_cents(row.delivery_fee_cents),
            minimum_order: Money::from_cents(row.minimum_order_cents),
            delivery_time_min: row.delivery_time_min,
            delivery_time_max: row.delivery_time_max,
            is_open: row.is_open,
            is_featured: row.is_featured,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const RESTAURANT_COLUMNS: &str = "id, name, slug, description, cuisine, phone, email, image_url, \
     address, rating, review_count, delivery_fee_cents, minimum_order_cents, delivery_time_min, \
     delivery_time_max, is_open, is_featured, is_active, created_at, updated_at";

/// Repository for restaurant database operations.
#[derive(Debug, Clone)]
pub struct RestaurantRepository {
    pool: SqlitePool,
}

impl RestaurantRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RestaurantRepository { pool }
    }

    /// Lists restaurants matching the filter, in id order.
    pub async fn list(&self, filter: &RestaurantFilter) -> DbResult<Page<Restaurant>> {
        debug!(?filter, "Listing restaurants");

        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM restaurants");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut query =
            QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM restaurants", RESTAURANT_COLUMNS));
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY id LIMIT ")
            .push_bind(filter.pagination.limit)
            .push(" OFFSET ")
            .push_bind(filter.pagination.offset());

        let rows: Vec<RestaurantRow> = query.build_query_as().fetch_all(&self.pool).await?;

        debug!(count = rows.len(), total, "Restaurant page loaded");
        Ok(Page::new(
            rows.into_iter().map(Restaurant::from).collect(),
            total,
            filter.pagination,
        ))
    }

    /// Gets a restaurant by id, active or not.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Restaurant>> {
        let row = sqlx::query_as::<_, RestaurantRow>(&format!(
            "SELECT {} FROM restaurants WHERE id = ?1",
            RESTAURANT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Restaurant::from))
    }

    pub async fn get_by_slug(&self, slug: &str) -> DbResult<Option<Restaurant>> {
        let row = sqlx::query_as::<_, RestaurantRow>(&format!(
            "SELECT {} FROM restaurants WHERE slug = ?1",
            RESTAURANT_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Restaurant::from))
    }

    /// Inserts a new restaurant. Rating starts at zero with no reviews.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` when the slug is taken.
    pub async fn insert(&self, input: &RestaurantInput) -> DbResult<Restaurant> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO restaurants (
                name, slug, description, cuisine, phone, email, image_url, address,
                delivery_fee_cents, minimum_order_cents, delivery_time_min, delivery_time_max,
                is_open, is_featured, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, 1, ?15, ?15)
            "#,
        )
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(&input.cuisine)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.image_url)
        .bind(&input.address)
        .bind(input.delivery_fee.cents())
        .bind(input.minimum_order.cents())
        .bind(input.delivery_time_min)
        .bind(input.delivery_time_max)
        .bind(input.is_open)
        .bind(input.is_featured)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } if field == "slug" => {
                DbError::duplicate("slug", input.slug.clone())
            }
            other => other,
        })?;

        let id = result.last_insert_rowid();
        debug!(id, slug = %input.slug, "Restaurant inserted");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Restaurant", id))
    }

    /// Replaces the editable fields of a restaurant.
    pub async fn update(&self, id: i64, input: &RestaurantInput) -> DbResult<Restaurant> {
        let result = sqlx::query(
            r#"
            UPDATE restaurants SET
                name = ?2, slug = ?3, description = ?4, cuisine = ?5, phone = ?6,
                email = ?7, image_url = ?8, address = ?9, delivery_fee_cents = ?10,
                minimum_order_cents = ?11, delivery_time_min = ?12, delivery_time_max = ?13,
                is_open = ?14, is_featured = ?15, updated_at = ?16
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(&input.cuisine)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.image_url)
        .bind(&input.address)
        .bind(input.delivery_fee.cents())
        .bind(input.minimum_order.cents())
        .bind(input.delivery_time_min)
        .bind(input.delivery_time_max)
        .bind(input.is_open)
        .bind(input.is_featured)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Restaurant", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Restaurant", id))
    }

    /// Soft delete (or restore). Orders and reviews keep pointing at the row.
    pub async fn set_active(&self, id: i64, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE restaurants SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Restaurant", id));
        }

        debug!(id, active, "Restaurant active flag changed");
        Ok(())
    }

    /// Recomputes rating (average, one decimal) and review count from the
    /// reviews table.
    pub async fn refresh_rating(&self, id: i64) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        refresh_rating_in(&mut conn, id).await
    }

    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM restaurants WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

pub(crate) async fn refresh_rating_in(conn: &mut SqliteConnection, id: i64) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE restaurants SET
            rating = COALESCE((SELECT ROUND(AVG(rating), 1) FROM reviews WHERE restaurant_id = ?1), 0),
            review_count = (SELECT COUNT(*) FROM reviews WHERE restaurant_id = ?1),
            updated_at = ?2
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &RestaurantFilter) {
    query.push(" WHERE 1 = 1");

    if !filter.include_inactive {
        query.push(" AND is_active = 1");
    }

    if let Some(search) = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let pattern = format!("%{}%", search.to_lowercase());
        query
            .push(" AND (LOWER(name) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(cuisine) LIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if !filter.cuisines.is_empty() {
        query.push(" AND LOWER(cuisine) IN (");
        let mut separated = query.separated(", ");
        for cuisine in &filter.cuisines {
            separated.push_bind(cuisine.trim().to_lowercase());
        }
        separated.push_unseparated(")");
    }

    if let Some(min_rating) = filter.min_rating {
        query.push(" AND rating >= ").push_bind(min_rating);
    }

    if let Some(featured) = filter.featured {
        query.push(" AND is_featured = ").push_bind(featured);
    }

    if let Some(is_open) = filter.is_open {
        query.push(" AND is_open = ").push_bind(is_open);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{insert_restaurant, restaurant_input, test_db};

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let db = test_db().await;
        let repo = db.restaurants();

        let created = repo.insert(&restaurant_input("Bella Italia", "Italian")).await.unwrap();
        assert_eq!(created.slug, "bella-italia");
        assert_eq!(created.rating, 0.0);
        assert!(created.is_active);
        assert_eq!(created.minimum_order.cents(), 1000);

        let by_slug = repo.get_by_slug("bella-italia").await.unwrap().unwrap();
        assert_eq!(by_slug.id, created.id);
        assert!(repo.get_by_id(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let db = test_db().await;
        let repo = db.restaurants();

        repo.insert(&restaurant_input("Thai Orchid", "Thai")).await.unwrap();
        let err = repo.insert(&restaurant_input("Thai Orchid", "Thai")).await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = test_db().await;
        let repo = db.restaurants();

        let bella = insert_restaurant(&db, "Bella Italia", "Italian").await;
        insert_restaurant(&db, "Sushi Master", "Japanese").await;
        let thai = insert_restaurant(&db, "Thai Orchid", "Thai").await;

        let mut input = restaurant_input("Pizza Piazza", "Italian");
        input.is_open = false;
        input.is_featured = true;
        repo.insert(&input).await.unwrap();

        let all = repo.list(&RestaurantFilter::default()).await.unwrap();
        assert_eq!(all.total, 4);
        assert_eq!(all.items[0].id, bella);

        let filter = RestaurantFilter {
            cuisines: vec!["italian".to_string(), "THAI".to_string()],
            ..Default::default()
        };
        assert_eq!(repo.list(&filter).await.unwrap().total, 3);

        let filter = RestaurantFilter {
            search: Some("SUSHI".to_string()),
            ..Default::default()
        };
        let page = repo.list(&filter).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "Sushi Master");

        let filter = RestaurantFilter {
            featured: Some(true),
            is_open: Some(false),
            ..Default::default()
        };
        assert_eq!(repo.list(&filter).await.unwrap().items[0].name, "Pizza Piazza");

        repo.set_active(thai, false).await.unwrap();
        let filter = RestaurantFilter {
            cuisines: vec!["thai".to_string()],
            ..Default::default()
        };
        assert_eq!(repo.list(&filter).await.unwrap().total, 0);
        assert_eq!(repo.count_active().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_list_pagination() {
        let db = test_db().await;
        for i in 0..5 {
            insert_restaurant(&db, &format!("Kitchen {}", i), "Fusion").await;
        }

        let filter = RestaurantFilter {
            pagination: Pagination::new(2, 2),
            ..Default::default()
        };
        let page = db.restaurants().list(&filter).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].name, "Kitchen 2");
        assert_eq!(page.total_pages(), 3);
    }

    #[tokio::test]
    async fn test_update_and_missing() {
        let db = test_db().await;
        let repo = db.restaurants();
        let id = insert_restaurant(&db, "Taco Fiesta", "Mexican").await;

        let mut input = restaurant_input("Taco Fiesta", "Mexican");
        input.delivery_fee = Money::from_cents(149);
        input.is_featured = true;
        let updated = repo.update(id, &input).await.unwrap();
        assert_eq!(updated.delivery_fee.cents(), 149);
        assert!(updated.is_featured);

        assert!(repo.update(777, &input).await.unwrap_err().is_not_found());
        assert!(repo.set_active(777, false).await.unwrap_err().is_not_found());
    }
}
