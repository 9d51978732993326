//! Shared application state.

use std::sync::Arc;

use foodie_db::Database;

use crate::accounts::AuthBackend;
use crate::auth::JwtManager;
use crate::config::ApiConfig;

/// Everything a handler can reach.
pub struct AppState {
    pub db: Database,
    pub config: ApiConfig,
    pub jwt: JwtManager,
    pub accounts: AuthBackend,
}

/// Router state handed to every handler.
pub type SharedState = Arc<AppState>;

impl AppState {
    /// Wires the token manager and the resolved auth backend around a database.
    pub fn new(db: Database, config: ApiConfig) -> SharedState {
        let jwt = JwtManager::new(
            config.jwt_secret.clone(),
            config.jwt_access_lifetime_secs,
            config.jwt_refresh_lifetime_secs,
        );
        let accounts = AuthBackend::for_kind(config.resolved_auth_backend(), &db);

        Arc::new(AppState {
            db,
            config,
            jwt,
            accounts,
        })
    }
}
