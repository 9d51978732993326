//! # Menu Repository
//!
//! Menu categories and items.
//!
//! A restaurant's menu is read as two flat queries (categories, items) and
//! grouped in memory into [`MenuSection`]s, both sides ordered by
//! `sort_order` then id.

use std::collections::HashMap;

use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use foodie_core::{MenuCategory, MenuItem, MenuSection, Money};

/// Fields for a new menu category.
#[derive(Debug, Clone)]
pub struct NewMenuCategory {
    pub restaurant_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i64,
}

/// Fields for a new menu item.
#[derive(Debug, Clone)]
pub struct NewMenuItem {
    pub restaurant_id: i64,
    pub category_id: i64,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub image_url: Option<String>,
    pub is_popular: bool,
    pub dietary_tags: Vec<String>,
    pub allergens: Vec<String>,
    pub calories: Option<i64>,
    pub preparation_time: i64,
    pub sort_order: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct MenuCategoryRow {
    id: i64,
    restaurant_id: i64,
    name: String,
    description: Option<String>,
    sort_order: i64,
}

impl From<MenuCategoryRow> for MenuCategory {
    fn from(row: MenuCategoryRow) -> Self {
        MenuCategory {
            id: row.id,
            restaurant_id: row.restaurant_id,
            name: row.name,
            description: row.description,
            sort_order: row.sort_order,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MenuItemRow {
    id: i64,
    restaurant_id: i64,
    category_id: i64,
    name: String,
    description: String,
    price_cents: i64,
    image_url: Option<String>,
    is_popular: bool,
    is_available: bool,
    dietary_tags: Json<Vec<String>>,
    allergens: Json<Vec<String>>,
    calories: Option<i64>,
    preparation_time: i64,
    sort_order: i64,
}

impl From<MenuItemRow> for MenuItem {
    fn from(row: MenuItemRow) -> Self {
        MenuItem {
            id: row.id,
            restaurant_id: row.restaurant_id,
            category_id: row.category_id,
            name: row.name,
            description: row.description,
            price: Money::from_cents(row.price_cents),
            image_url: row.image_url,
            is_popular: row.is_popular,
            is_available: row.is_available,
            dietary_tags: row.dietary_tags.0,
            allergens: row.allergens.0,
            calories: row.calories,
            preparation_time: row.preparation_time,
            sort_order: row.sort_order,
        }
    }
}

const ITEM_COLUMNS: &str = "id, restaurant_id, category_id, name, description, price_cents, \
     image_url, is_popular, is_available, dietary_tags, allergens, calories, preparation_time, \
     sort_order";

/// Repository for menu database operations.
#[derive(Debug, Clone)]
pub struct MenuRepository {
    pool: SqlitePool,
}

impl MenuRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MenuRepository { pool }
    }

    /// The full menu of a restaurant, categories in display order, each with
    /// its items. Unavailable items are included and flagged.
    pub async fn menu_for_restaurant(&self, restaurant_id: i64) -> DbResult<Vec<MenuSection>> {
        let categories = self.list_categories(restaurant_id).await?;

        let items = sqlx::query_as::<_, MenuItemRow>(&format!(
            "SELECT {} FROM menu_items WHERE restaurant_id = ?1 ORDER BY sort_order, id",
            ITEM_COLUMNS
        ))
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_category: HashMap<i64, Vec<MenuItem>> = HashMap::new();
        for row in items {
            let item = MenuItem::from(row);
            by_category.entry(item.category_id).or_default().push(item);
        }

        let sections: Vec<MenuSection> = categories
            .into_iter()
            .map(|category| MenuSection {
                items: by_category.remove(&category.id).unwrap_or_default(),
                id: category.id,
                name: category.name,
                description: category.description,
            })
            .collect();

        debug!(restaurant_id, sections = sections.len(), "Menu loaded");
        Ok(sections)
    }

    pub async fn list_categories(&self, restaurant_id: i64) -> DbResult<Vec<MenuCategory>> {
        let rows = sqlx::query_as::<_, MenuCategoryRow>(
            r#"
            SELECT id, restaurant_id, name, description, sort_order
            FROM menu_categories
            WHERE restaurant_id = ?1
            ORDER BY sort_order, id
            "#,
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(MenuCategory::from).collect())
    }

    pub async fn get_item(&self, id: i64) -> DbResult<Option<MenuItem>> {
        let row = sqlx::query_as::<_, MenuItemRow>(&format!(
            "SELECT {} FROM menu_items WHERE id = ?1",
            ITEM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MenuItem::from))
    }

    /// Loads several items at once (checkout and cart quotes). Missing ids
    /// are simply absent from the result.
    pub async fn get_items(&self, ids: &[i64]) -> DbResult<Vec<MenuItem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query =
            QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM menu_items WHERE id IN (", ITEM_COLUMNS));
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let rows: Vec<MenuItemRow> = query.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(MenuItem::from).collect())
    }

    pub async fn insert_category(&self, category: &NewMenuCategory) -> DbResult<MenuCategory> {
        let id = sqlx::query(
            r#"
            INSERT INTO menu_categories (restaurant_id, name, description, sort_order)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(category.restaurant_id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.sort_order)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(MenuCategory {
            id,
            restaurant_id: category.restaurant_id,
            name: category.name.clone(),
            description: category.description.clone(),
            sort_order: category.sort_order,
        })
    }

    /// Inserts a menu item.
    ///
    /// ## Errors
    /// `DbError::ForeignKeyViolation` when the category does not exist or
    /// belongs to another restaurant.
    pub async fn insert_item(&self, item: &NewMenuItem) -> DbResult<MenuItem> {
        let category_restaurant: Option<i64> =
            sqlx::query_scalar("SELECT restaurant_id FROM menu_categories WHERE id = ?1")
                .bind(item.category_id)
                .fetch_optional(&self.pool)
                .await?;

        if category_restaurant != Some(item.restaurant_id) {
            return Err(DbError::ForeignKeyViolation {
                message: format!(
                    "category {} does not belong to restaurant {}",
                    item.category_id, item.restaurant_id
                ),
            });
        }

        let id = sqlx::query(
            r#"
            INSERT INTO menu_items (
                restaurant_id, category_id, name, description, price_cents, image_url,
                is_popular, is_available, dietary_tags, allergens, calories,
                preparation_time, sort_order
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(item.restaurant_id)
        .bind(item.category_id)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price.cents())
        .bind(&item.image_url)
        .bind(item.is_popular)
        .bind(Json(&item.dietary_tags))
        .bind(Json(&item.allergens))
        .bind(item.calories)
        .bind(item.preparation_time)
        .bind(item.sort_order)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        debug!(id, restaurant_id = item.restaurant_id, "Menu item inserted");

        self.get_item(id)
            .await?
            .ok_or_else(|| DbError::not_found("MenuItem", id))
    }

    pub async fn set_item_available(&self, id: i64, available: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE menu_items SET is_available = ?2 WHERE id = ?1")
            .bind(id)
            .bind(available)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("MenuItem", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
