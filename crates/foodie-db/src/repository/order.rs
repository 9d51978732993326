//! # Order Repository
//!
//! Database operations for placed orders.
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    OrderRepository::create                              │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │    ├── next order number (ORD-<millis>, strictly increasing)           │
//! │    ├── INSERT orders                                                   │
//! │    ├── INSERT order_items (one per line, name/price snapshots)         │
//! │    ├── INSERT order_status_history (initial status)                    │
//! │    └── promo code? → usage_count + 1 (fails if the limit was hit)      │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  Any failure rolls back everything: no half-written orders.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::promotion::increment_usage_in;
use foodie_core::order::{order_number_from_millis, order_number_millis, OrderStatusEntry};
use foodie_core::{
    DeliveryAddress, Money, Order, OrderDetail, OrderItem, OrderStatus, OrderTotals, Page,
    Pagination, PaymentMethod, RestaurantSummary,
};

/// An order ready to be written, already priced.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<String>,
    pub restaurant_id: i64,
    pub status: OrderStatus,
    pub totals: OrderTotals,
    pub promo_code: Option<String>,
    pub delivery_address: DeliveryAddress,
    pub payment_method: PaymentMethod,
    pub estimated_delivery_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<NewOrderItem>,
    /// Note on the first status history row.
    pub notes: Option<String>,
}

/// One line of a new order. Name and price are snapshots taken at checkout.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub menu_item_id: i64,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub special_instructions: Option<String>,
}

impl NewOrderItem {
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// Order listing filter. Results are newest first.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub user_id: Option<String>,
    pub status: Option<OrderStatus>,
    pub restaurant_id: Option<i64>,
    pub pagination: Pagination,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    order_number: String,
    user_id: Option<String>,
    restaurant_id: i64,
    status: OrderStatus,
    subtotal_cents: i64,
    delivery_fee_cents: i64,
    discount_cents: i64,
    tax_cents: i64,
    total_cents: i64,
    promo_code: Option<String>,
    delivery_street: String,
    delivery_city: String,
    delivery_state: String,
    delivery_zip: String,
    delivery_country: Option<String>,
    delivery_instructions: Option<String>,
    payment_method: PaymentMethod,
    estimated_delivery_at: DateTime<Utc>,
    delivered_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Order {
            id: row.id,
            order_number: row.order_number,
            user_id: row.user_id,
            restaurant_id: row.restaurant_id,
            status: row.status,
            totals: OrderTotals {
                subtotal: Money::from_cents(row.subtotal_cents),
                delivery_fee: Money::from_cents(row.delivery_fee_cents),
                discount: Money::from_cents(row.discount_cents),
                tax: Money::from_cents(row.tax_cents),
                total: Money::from_cents(row.total_cents),
            },
            promo_code: row.promo_code,
            delivery_address: DeliveryAddress {
                street: row.delivery_street,
                city: row.delivery_city,
                state: row.delivery_state,
                zip_code: row.delivery_zip,
                country: row.delivery_country,
                instructions: row.delivery_instructions,
            },
            payment_method: row.payment_method,
            estimated_delivery_at: row.estimated_delivery_at,
            delivered_at: row.delivered_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i64,
    order_id: i64,
    menu_item_id: i64,
    name_snapshot: String,
    unit_price_cents: i64,
    quantity: i64,
    line_total_cents: i64,
    special_instructions: Option<String>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            order_id: row.order_id,
            menu_item_id: row.menu_item_id,
            name: row.name_snapshot,
            unit_price: Money::from_cents(row.unit_price_cents),
            quantity: row.quantity,
            line_total: Money::from_cents(row.line_total_cents),
            special_instructions: row.special_instructions,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StatusHistoryRow {
    id: i64,
    order_id: i64,
    status: OrderStatus,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<StatusHistoryRow> for OrderStatusEntry {
    fn from(row: StatusHistoryRow) -> Self {
        OrderStatusEntry {
            id: row.id,
            order_id: row.order_id,
            status: row.status,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RestaurantSummaryRow {
    id: i64,
    name: String,
    slug: String,
    image_url: Option<String>,
    phone: String,
}

const ORDER_COLUMNS: &str = "id, order_number, user_id, restaurant_id, status, subtotal_cents, \
     delivery_fee_cents, discount_cents, tax_cents, total_cents, promo_code, delivery_street, \
     delivery_city, delivery_state, delivery_zip, delivery_country, delivery_instructions, \
     payment_method, estimated_delivery_at, delivered_at, created_at, updated_at";

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Writes an order with its items and first history row in one
    /// transaction, and counts the promo code use.
    ///
    /// ## Errors
    /// - `DbError::Conflict` when the promo code reached its usage limit
    /// - `DbError::ForeignKeyViolation` for an unknown restaurant or menu item
    pub async fn create(&self, new_order: &NewOrder) -> DbResult<Order> {
        let mut tx = self.pool.begin().await?;

        let order_number = next_order_number(&mut tx, new_order.created_at).await?;
        let address = &new_order.delivery_address;
        let totals = &new_order.totals;

        let order_id = sqlx::query(
            r#"
            INSERT INTO orders (
                order_number, user_id, restaurant_id, status,
                subtotal_cents, delivery_fee_cents, discount_cents, tax_cents, total_cents,
                promo_code, delivery_street, delivery_city, delivery_state, delivery_zip,
                delivery_country, delivery_instructions, payment_method,
                estimated_delivery_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?19)
            "#,
        )
        .bind(&order_number)
        .bind(&new_order.user_id)
        .bind(new_order.restaurant_id)
        .bind(new_order.status)
        .bind(totals.subtotal.cents())
        .bind(totals.delivery_fee.cents())
        .bind(totals.discount.cents())
        .bind(totals.tax.cents())
        .bind(totals.total.cents())
        .bind(&new_order.promo_code)
        .bind(&address.street)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.zip_code)
        .bind(&address.country)
        .bind(&address.instructions)
        .bind(new_order.payment_method)
        .bind(new_order.estimated_delivery_at)
        .bind(new_order.created_at)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for item in &new_order.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    order_id, menu_item_id, name_snapshot, unit_price_cents,
                    quantity, line_total_cents, special_instructions
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(order_id)
            .bind(item.menu_item_id)
            .bind(&item.name)
            .bind(item.unit_price.cents())
            .bind(item.quantity)
            .bind(item.line_total().cents())
            .bind(&item.special_instructions)
            .execute(&mut *tx)
            .await?;
        }

        insert_history(
            &mut tx,
            order_id,
            new_order.status,
            new_order.notes.as_deref(),
            new_order.created_at,
        )
        .await?;

        if let Some(code) = &new_order.promo_code {
            if !increment_usage_in(&mut tx, code).await? {
                // Dropping the transaction rolls it back
                return Err(DbError::Conflict(format!(
                    "Promo code {} usage limit exceeded",
                    code
                )));
            }
        }

        tx.commit().await?;

        info!(
            order_id,
            order_number = %order_number,
            total = %totals.total,
            "Order created"
        );

        self.get(order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE id = ?1",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Order::from))
    }

    pub async fn get_by_number(&self, order_number: &str) -> DbResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE order_number = ?1",
            ORDER_COLUMNS
        ))
        .bind(order_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Order::from))
    }

    /// Order with its restaurant, lines and status history (oldest first).
    pub async fn get_detail(&self, id: i64) -> DbResult<Option<OrderDetail>> {
        let Some(order) = self.get(id).await? else {
            return Ok(None);
        };

        let restaurant = sqlx::query_as::<_, RestaurantSummaryRow>(
            "SELECT id, name, slug, image_url, phone FROM restaurants WHERE id = ?1",
        )
        .bind(order.restaurant_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::NotFound { .. } => DbError::not_found("Restaurant", order.restaurant_id),
            other => other,
        })?;

        let items = self.items(id).await?;

        let history = sqlx::query_as::<_, StatusHistoryRow>(
            r#"
            SELECT id, order_id, status, notes, created_at
            FROM order_status_history
            WHERE order_id = ?1
            ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(OrderDetail {
            order,
            restaurant: RestaurantSummary {
                id: restaurant.id,
                name: restaurant.name,
                slug: restaurant.slug,
                image_url: restaurant.image_url,
                phone: restaurant.phone,
            },
            items,
            status_history: history.into_iter().map(OrderStatusEntry::from).collect(),
        }))
    }

    pub async fn items(&self, order_id: i64) -> DbResult<Vec<OrderItem>> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT id, order_id, menu_item_id, name_snapshot, unit_price_cents,
                   quantity, line_total_cents, special_instructions
            FROM order_items
            WHERE order_id = ?1
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderItem::from).collect())
    }

    /// Lists orders, newest first.
    pub async fn list(&self, filter: &OrderFilter) -> DbResult<Page<Order>> {
        debug!(?filter, "Listing orders");

        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM orders");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM orders", ORDER_COLUMNS));
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(filter.pagination.limit)
            .push(" OFFSET ")
            .push_bind(filter.pagination.offset());

        let rows: Vec<OrderRow> = query.build_query_as().fetch_all(&self.pool).await?;

        Ok(Page::new(
            rows.into_iter().map(Order::from).collect(),
            total,
            filter.pagination,
        ))
    }

    /// Moves an order from `from` to `to` and appends a history row.
    ///
    /// The caller has already checked the transition is legal; `from` guards
    /// against a concurrent update. Reaching `delivered` stamps `delivered_at`.
    ///
    /// ## Errors
    /// - `DbError::NotFound` when the order does not exist
    /// - `DbError::Conflict` when the order is no longer in `from`
    pub async fn update_status(
        &self,
        id: i64,
        from: OrderStatus,
        to: OrderStatus,
        notes: Option<&str>,
    ) -> DbResult<Order> {
        let now = Utc::now();
        let delivered_at = (to == OrderStatus::Delivered).then_some(now);

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = ?3, updated_at = ?4, delivered_at = COALESCE(?5, delivered_at)
            WHERE id = ?1 AND status = ?2
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(now)
        .bind(delivered_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM orders WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

            return Err(match exists {
                Some(_) => DbError::Conflict(format!("order {} is no longer {}", id, from)),
                None => DbError::not_found("Order", id),
            });
        }

        insert_history(&mut tx, id, to, notes, now).await?;

        tx.commit().await?;

        info!(order_id = id, %from, %to, "Order status updated");

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))
    }
}

/// `ORD-<millis>` from the order time, bumped past the latest number so two
/// checkouts in the same millisecond still get distinct numbers.
async fn next_order_number(conn: &mut SqliteConnection, created_at: DateTime<Utc>) -> DbResult<String> {
    let last: Option<String> =
        sqlx::query_scalar("SELECT order_number FROM orders ORDER BY id DESC LIMIT 1")
            .fetch_optional(&mut *conn)
            .await?;

    let millis = created_at.timestamp_millis();
    let millis = match last.as_deref().and_then(order_number_millis) {
        Some(previous) if previous >= millis => previous + 1,
        _ => millis,
    };

    Ok(order_number_from_millis(millis))
}

async fn insert_history(
    conn: &mut SqliteConnection,
    order_id: i64,
    status: OrderStatus,
    notes: Option<&str>,
    at: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO order_status_history (order_id, status, notes, created_at) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(order_id)
    .bind(status)
    .bind(notes)
    .bind(at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &OrderFilter) {
    query.push(" WHERE 1 = 1");

    if let Some(user_id) = &filter.user_id {
        query.push(" AND user_id = ").push_bind(user_id.clone());
    }

    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status);
    }

    if let Some(restaurant_id) = filter.restaurant_id {
        query.push(" AND restaurant_id = ").push_bind(restaurant_id);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
