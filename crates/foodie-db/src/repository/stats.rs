//! # Stats Repository
//!
//! Aggregates for the admin dashboard.
//!
//! ```text
//! totalRevenue       SUM(total) of delivered orders, last 30 days
//! totalOrders        COUNT of orders, last 30 days
//! activeUsers        COUNT(DISTINCT user_id) of orders, last 30 days
//! activeRestaurants  COUNT of restaurants with is_active = 1
//! revenueTrend       delivered revenue per day, last 7 days (today included,
//!                    days without sales reported as zero)
//! recentOrders       newest 5 orders
//! ```
//!
//! Windows start at midnight UTC, so "last 30 days" means today plus the
//! 30 calendar days before it.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::order::{OrderFilter, OrderRepository};
use foodie_core::{Money, Order, Pagination};

/// Orders shown in the dashboard's recent list.
pub const RECENT_ORDERS: i64 = 5;

/// Days in the revenue trend, today included.
pub const TREND_DAYS: i64 = 7;

/// Revenue of one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRevenue {
    /// `YYYY-MM-DD`
    pub date: String,
    pub revenue: Money,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_revenue: Money,
    pub total_orders: i64,
    pub active_users: i64,
    pub active_restaurants: i64,
    pub revenue_trend: Vec<DailyRevenue>,
    pub recent_orders: Vec<Order>,
}

/// Repository for dashboard aggregates.
#[derive(Debug, Clone)]
pub struct StatsRepository {
    pool: SqlitePool,
}

impl StatsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StatsRepository { pool }
    }

    pub async fn dashboard(&self, now: DateTime<Utc>) -> DbResult<DashboardStats> {
        let month_start = day_start(now) - Duration::days(30);
        let trend_start = day_start(now) - Duration::days(TREND_DAYS - 1);

        let total_revenue: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_cents), 0) FROM orders WHERE status = 'delivered' AND created_at >= ?1",
        )
        .bind(month_start)
        .fetch_one(&self.pool)
        .await?;

        let (total_orders, active_users): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(DISTINCT user_id) FROM orders WHERE created_at >= ?1",
        )
        .bind(month_start)
        .fetch_one(&self.pool)
        .await?;

        let active_restaurants: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM restaurants WHERE is_active = 1")
                .fetch_one(&self.pool)
                .await?;

        let daily: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT substr(created_at, 1, 10) AS day, SUM(total_cents) AS revenue
            FROM orders
            WHERE status = 'delivered' AND created_at >= ?1
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(trend_start)
        .fetch_all(&self.pool)
        .await?;

        let revenue_trend = (0..TREND_DAYS)
            .map(|offset| {
                let date = (trend_start + Duration::days(offset))
                    .format("%Y-%m-%d")
                    .to_string();
                let revenue = daily
                    .iter()
                    .find(|(day, _)| *day == date)
                    .map(|(_, cents)| Money::from_cents(*cents))
                    .unwrap_or_default();
                DailyRevenue { date, revenue }
            })
            .collect();

        let recent_orders = OrderRepository::new(self.pool.clone())
            .list(&OrderFilter {
                pagination: Pagination::new(1, RECENT_ORDERS),
                ..Default::default()
            })
            .await?
            .items;

        debug!(total_revenue, total_orders, active_users, "Dashboard stats computed");

        Ok(DashboardStats {
            total_revenue: Money::from_cents(total_revenue),
            total_orders,
            active_users,
            active_restaurants,
            revenue_trend,
            recent_orders,
        })
    }
}

fn day_start(at: DateTime<Utc>) -> DateTime<Utc> {
    at.date_naive().and_time(NaiveTime::MIN).and_utc()
}

// =============================================================================
// Unit Tests
// =============================================================================
