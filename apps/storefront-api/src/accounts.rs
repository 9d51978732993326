//! Account backends.
//!
//! ```text
//!                  ┌──────────────────────┐
//!   login ────────►│     AuthBackend      │
//!   register ─────►│                      │
//!   /me ──────────►│  Database │ Mock     │
//!                  └─────┬─────┴────┬─────┘
//!                        │          │
//!              users table      fixed demo table
//!              argon2 hashes    + in-process signups
//! ```
//!
//! Both sides hand back a [`User`]; token issue happens above, so clients
//! cannot tell which one answered.

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use foodie_core::{User, UserRole};
use foodie_db::password::{hash_password, verify_password};
use foodie_db::{Database, DbError, NewUser};

use crate::config::AuthBackendKind;
use crate::error::{ApiError, ApiResult};

const BAD_CREDENTIALS: &str = "No account found with these credentials. Please sign up first.";

/// Validated registration input.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

/// Where credentials are checked.
pub enum AuthBackend {
    Database(DatabaseAuth),
    Mock(MockAuth),
}

impl AuthBackend {
    /// Builds the backend for an already-resolved kind.
    pub fn for_kind(kind: AuthBackendKind, db: &Database) -> Self {
        match kind {
            AuthBackendKind::Database => AuthBackend::Database(DatabaseAuth::new(db.clone())),
            AuthBackendKind::Mock | AuthBackendKind::Auto => AuthBackend::Mock(MockAuth::new()),
        }
    }

    pub fn kind(&self) -> AuthBackendKind {
        match self {
            AuthBackend::Database(_) => AuthBackendKind::Database,
            AuthBackend::Mock(_) => AuthBackendKind::Mock,
        }
    }

    pub async fn register(&self, account: NewAccount) -> ApiResult<User> {
        match self {
            AuthBackend::Database(auth) => auth.register(account).await,
            AuthBackend::Mock(auth) => auth.register(account).await,
        }
    }

    /// Checks an email/password pair.
    ///
    /// ## Errors
    /// `ApiError::AuthFailed` for an unknown email or a wrong password alike.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<User> {
        let user = match self {
            AuthBackend::Database(auth) => auth.login(email, password).await?,
            AuthBackend::Mock(auth) => auth.login(email, password).await,
        };

        user.ok_or_else(|| {
            warn!(email = %email, "Login rejected");
            ApiError::AuthFailed(BAD_CREDENTIALS.to_string())
        })
    }

    pub async fn find_user(&self, id: &str) -> ApiResult<Option<User>> {
        match self {
            AuthBackend::Database(auth) => Ok(auth.db.users().get_by_id(id).await?),
            AuthBackend::Mock(auth) => Ok(auth.find(id).await),
        }
    }
}

// =============================================================================
// Database Backend
// =============================================================================

/// Accounts stored in the `users` table.
pub struct DatabaseAuth {
    db: Database,
}

impl DatabaseAuth {
    pub fn new(db: Database) -> Self {
        DatabaseAuth { db }
    }

    async fn register(&self, account: NewAccount) -> ApiResult<User> {
        let password_hash = hash_password(&account.password)?;

        let user = self
            .db
            .users()
            .insert(&NewUser {
                username: account.username,
                email: account.email,
                password_hash,
                first_name: account.first_name,
                last_name: account.last_name,
                phone: account.phone,
                role: UserRole::User,
            })
            .await
            .map_err(duplicate_account)?;

        info!(user_id = %user.id, "Account registered");
        Ok(user)
    }

    async fn login(&self, email: &str, password: &str) -> ApiResult<Option<User>> {
        let stored = self.db.users().get_by_email(email).await?;

        Ok(stored
            .filter(|stored| verify_password(password, &stored.password_hash))
            .map(|stored| stored.user))
    }
}

fn duplicate_account(error: DbError) -> ApiError {
    match error {
        DbError::UniqueViolation { field, .. } if field == "username" => {
            ApiError::Conflict("Username is already taken".to_string())
        }
        DbError::UniqueViolation { .. } => {
            ApiError::Conflict("An account with this email already exists".to_string())
        }
        other => other.into(),
    }
}

// =============================================================================
// Mock Backend
// =============================================================================

struct MockAccount {
    user: User,
    password: String,
}

/// In-process accounts for running without a configured backend.
///
/// Passwords are compared as given; nothing here outlives the process.
pub struct MockAuth {
    accounts: RwLock<Vec<MockAccount>>,
}

impl MockAuth {
    pub fn new() -> Self {
        let fixed = [
            ("1", "john_doe", "john@example.com", "password", "John", "Doe", UserRole::User),
            ("2", "jane_smith", "jane@example.com", "password", "Jane", "Smith", UserRole::User),
            ("admin", "admin", "admin@foodie.com", "admin123", "Admin", "User", UserRole::Admin),
            ("admin-2", "admin_gmail", "admin@gmail.com", "admin123", "Admin", "User", UserRole::Admin),
        ];

        let now = Utc::now();
        let accounts = fixed
            .into_iter()
            .map(|(id, username, email, password, first, last, role)| MockAccount {
                user: User {
                    id: id.to_string(),
                    username: username.to_string(),
                    email: email.to_string(),
                    first_name: first.to_string(),
                    last_name: last.to_string(),
                    phone: None,
                    avatar_url: None,
                    role,
                    created_at: now,
                },
                password: password.to_string(),
            })
            .collect();

        MockAuth {
            accounts: RwLock::new(accounts),
        }
    }

    async fn register(&self, account: NewAccount) -> ApiResult<User> {
        let mut accounts = self.accounts.write().await;

        if accounts
            .iter()
            .any(|a| a.user.email.eq_ignore_ascii_case(&account.email))
        {
            return Err(ApiError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }

        if accounts
            .iter()
            .any(|a| a.user.username.eq_ignore_ascii_case(&account.username))
        {
            return Err(ApiError::Conflict("Username is already taken".to_string()));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            username: account.username,
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
            phone: account.phone,
            avatar_url: None,
            role: UserRole::User,
            created_at: Utc::now(),
        };

        accounts.push(MockAccount {
            user: user.clone(),
            password: account.password,
        });

        info!(user_id = %user.id, "Mock account registered");
        Ok(user)
    }

    async fn login(&self, email: &str, password: &str) -> Option<User> {
        self.accounts
            .read()
            .await
            .iter()
            .find(|a| a.user.email.eq_ignore_ascii_case(email.trim()) && a.password == password)
            .map(|a| a.user.clone())
    }

    async fn find(&self, id: &str) -> Option<User> {
        self.accounts
            .read()
            .await
            .iter()
            .find(|a| a.user.id == id)
            .map(|a| a.user.clone())
    }
}

impl Default for MockAuth {
    fn default() -> Self {
        MockAuth::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foodie_db::DbConfig;

    fn account(username: &str, email: &str) -> NewAccount {
        NewAccount {
            username: username.to_string(),
            email: email.to_string(),
            password: "secret123".to_string(),
            first_name: "Sam".to_string(),
            last_name: "Lee".to_string(),
            phone: None,
        }
    }

    #[tokio::test]
    async fn test_mock_fixed_accounts() {
        let auth = AuthBackend::Mock(MockAuth::new());

        let john = auth.login("john@example.com", "password").await.unwrap();
        assert_eq!(john.role, UserRole::User);

        let admin = auth.login("admin@gmail.com", "admin123").await.unwrap();
        assert!(admin.is_admin());

        assert!(matches!(
            auth.login("john@example.com", "wrong").await,
            Err(ApiError::AuthFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_mock_register_then_login() {
        let auth = AuthBackend::Mock(MockAuth::new());

        let user = auth.register(account("samlee", "sam@example.com")).await.unwrap();
        let found = auth.find_user(&user.id).await.unwrap().unwrap();
        assert_eq!(found.email, "sam@example.com");

        let logged_in = auth.login("sam@example.com", "secret123").await.unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn test_mock_rejects_duplicates() {
        let auth = AuthBackend::Mock(MockAuth::new());

        let err = auth.register(account("someone", "John@Example.com")).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        let err = auth.register(account("john_doe", "new@example.com")).await.unwrap_err();
        assert_eq!(err.to_string(), "Username is already taken");
    }

    #[tokio::test]
    async fn test_database_register_and_login() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let auth = AuthBackend::for_kind(AuthBackendKind::Database, &db);
        assert_eq!(auth.kind(), AuthBackendKind::Database);

        let user = auth.register(account("samlee", "sam@example.com")).await.unwrap();
        let logged_in = auth.login("sam@example.com", "secret123").await.unwrap();
        assert_eq!(logged_in.id, user.id);

        assert!(auth.login("sam@example.com", "nope").await.is_err());

        let err = auth.register(account("samlee", "other@example.com")).await.unwrap_err();
        assert_eq!(err.to_string(), "Username is already taken");
    }
}
