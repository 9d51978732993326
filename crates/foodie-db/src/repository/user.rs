//! # User Repository
//!
//! Stored storefront accounts. Passwords arrive here already hashed (see
//! [`crate::password`]); lookups that feed a login return the hash alongside
//! the user as a [`StoredUser`].

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use foodie_core::{User, UserRole};

/// Fields for a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
}

/// A user together with the password hash, for credential checks.
#[derive(Debug, Clone)]
pub struct StoredUser {
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    username: String,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    avatar_url: Option<String>,
    role: UserRole,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for StoredUser {
    fn from(row: UserRow) -> Self {
        StoredUser {
            password_hash: row.password_hash,
            user: User {
                id: row.id,
                username: row.username,
                email: row.email,
                first_name: row.first_name,
                last_name: row.last_name,
                phone: row.phone,
                avatar_url: row.avatar_url,
                role: row.role,
                created_at: row.created_at,
            },
        }
    }
}

const USER_COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, phone, \
     avatar_url, role, created_at";

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates an account with a fresh UUID.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` with field `email` or `username`.
    pub async fn insert(&self, new_user: &NewUser) -> DbResult<User> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, email, password_hash, first_name, last_name,
                phone, role, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            "#,
        )
        .bind(&id)
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.phone)
        .bind(new_user.role)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } if field == "email" => {
                DbError::duplicate("email", new_user.email.clone())
            }
            DbError::UniqueViolation { field, .. } if field == "username" => {
                DbError::duplicate("username", new_user.username.clone())
            }
            other => other,
        })?;

        debug!(user_id = %id, username = %new_user.username, "User inserted");

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found("User", &id))
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        Ok(self
            .fetch_one_where("id = ?1", id)
            .await?
            .map(|stored| stored.user))
    }

    /// Case-insensitive email lookup, with the hash for login.
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<StoredUser>> {
        self.fetch_one_where("email = ?1", email.trim()).await
    }

    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<StoredUser>> {
        self.fetch_one_where("username = ?1", username.trim()).await
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn fetch_one_where(&self, condition: &str, value: &str) -> DbResult<Option<StoredUser>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE {}",
            USER_COLUMNS, condition
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(StoredUser::from))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
