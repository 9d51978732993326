//! # Schema Migrations
//!
//! The storefront schema ships inside the binary and is brought up to date
//! whenever a [`Database`](crate::Database) opens with migrations enabled.
//!
//! ## Schema
//! ```text
//! 001_initial_schema.sql
//!   users ──────────────┐
//!   restaurants ─┬──────┼──► orders ──┬──► order_items
//!                │      │             └──► order_status_history
//!                ├──► menu_categories ──► menu_items
//!                └──► reviews (one per order, refreshes restaurant rating)
//!   promotions  (code unique, usage counted at checkout)
//! ```
//!
//! New tables or columns go in a new `NNN_<name>.sql` file under
//! `migrations/sqlite/`; applied files are checksummed by sqlx, so an edited
//! one fails the next startup.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// How far the live schema is from the embedded one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaStatus {
    pub applied: usize,
    pub expected: usize,
}

impl SchemaStatus {
    #[inline]
    pub fn is_current(&self) -> bool {
        self.applied >= self.expected
    }
}

/// Applies every embedded migration not yet recorded.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(embedded = MIGRATOR.migrations.len(), "Checking schema");
    MIGRATOR.run(pool).await?;
    info!("Schema up to date");
    Ok(())
}

/// Counts successful migrations in `_sqlx_migrations`.
///
/// A database opened with migrations disabled has no bookkeeping table yet
/// and reports zero applied.
pub async fn schema_status(pool: &SqlitePool) -> DbResult<SchemaStatus> {
    let has_table: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations')",
    )
    .fetch_one(pool)
    .await?;

    let applied: i64 = if has_table {
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?
    } else {
        0
    };

    Ok(SchemaStatus {
        applied: usize::try_from(applied).unwrap_or_default(),
        expected: MIGRATOR.migrations.len(),
    })
}
