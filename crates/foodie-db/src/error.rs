//! # Repository Errors
//!
//! Every repository call returns [`DbResult`]. SQLite reports constraint
//! failures only as message text, so the `sqlx::Error` conversion reads that
//! text and names the columns involved:
//!
//! ```text
//! "UNIQUE constraint failed: users.email"            → UniqueViolation { field: "email" }
//! "UNIQUE constraint failed: reviews.user_id, ..."   → UniqueViolation { field: "user_id, order_id" }
//! "FOREIGN KEY constraint failed"                    → ForeignKeyViolation
//! RowNotFound                                        → NotFound
//! PoolTimedOut / PoolClosed                          → Unavailable
//! ```
//!
//! The API layer turns these into HTTP statuses; nothing here knows about HTTP.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// No row for the id, or a guarded update matched nothing.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A username, email, slug, promo code or per-order review already
    /// exists. `value` is filled in by repositories that know what was
    /// inserted.
    #[error("{field} already in use{}", quoted(.value))]
    UniqueViolation {
        field: String,
        value: Option<String>,
    },

    /// An order, menu item or review points at a row that is not there.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Order status moved, or a promo ran out, between read and write.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The pool could not open, timed out or was closed.
    #[error("Database unavailable: {0}")]
    Unavailable(String),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// SQLite rejected a statement for any other reason.
    #[error("Query failed: {0}")]
    Query(String),

    #[error("Internal database error: {0}")]
    Internal(String),
}

fn quoted(value: &Option<String>) -> String {
    value
        .as_deref()
        .map(|v| format!(": '{v}'"))
        .unwrap_or_default()
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// A unique violation for a known field and the value that collided.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: Some(value.into()),
        }
    }

    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound { .. })
    }

    #[inline]
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation { .. })
    }
}

/// Column names from `table.col[, table.col]`, without the table prefix.
fn constraint_columns(detail: &str) -> String {
    detail
        .split(',')
        .map(|part| {
            let part = part.trim();
            part.rsplit_once('.').map_or(part, |(_, column)| column)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                if let Some(detail) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        field: constraint_columns(detail),
                        value: None,
                    }
                } else if msg.starts_with("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::Query(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => {
                DbError::Unavailable("timed out waiting for a connection".to_string())
            }
            sqlx::Error::PoolClosed => DbError::Unavailable("pool is closed".to_string()),

            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Internal(format!("JSON column: {err}"))
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_columns_drop_table_prefix() {
        assert_eq!(constraint_columns("users.email"), "email");
        assert_eq!(
            constraint_columns("reviews.user_id, reviews.order_id"),
            "user_id, order_id"
        );
        assert_eq!(constraint_columns("code"), "code");
    }

    #[test]
    fn test_duplicate_message_names_value() {
        assert_eq!(
            DbError::duplicate("slug", "bella-italia").to_string(),
            "slug already in use: 'bella-italia'"
        );

        let unnamed = DbError::UniqueViolation {
            field: "order_number".to_string(),
            value: None,
        };
        assert_eq!(unnamed.to_string(), "order_number already in use");
    }

    #[test]
    fn test_pool_errors_are_unavailable() {
        assert!(matches!(
            DbError::from(sqlx::Error::PoolClosed),
            DbError::Unavailable(_)
        ));
        assert!(DbError::from(sqlx::Error::RowNotFound).is_not_found());
    }

    #[tokio::test]
    async fn test_sqlite_unique_failure_names_column() {
        let db = crate::Database::new(crate::DbConfig::in_memory()).await.unwrap();

        sqlx::query("CREATE TABLE tags (name TEXT NOT NULL UNIQUE)")
            .execute(db.pool())
            .await
            .unwrap();
        sqlx::query("INSERT INTO tags (name) VALUES ('spicy')")
            .execute(db.pool())
            .await
            .unwrap();

        let err: DbError = sqlx::query("INSERT INTO tags (name) VALUES ('spicy')")
            .execute(db.pool())
            .await
            .unwrap_err()
            .into();

        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "name");
                assert_eq!(value, None);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
