//! Storefront API configuration module.
//!
//! Values are layered: built-in defaults, then an optional `storefront.toml`
//! in the working directory, then `FOODIE_*` environment variables
//! (`FOODIE_PORT`, `FOODIE_JWT_SECRET`, ...).

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use foodie_core::{TaxRate, DEFAULT_TAX_RATE_BPS};

/// Signing secret used when none is configured. Never valid for database auth.
pub const DEV_JWT_SECRET: &str = "foodie-dev-secret-change-in-production";

/// Config file looked up next to the binary's working directory.
const CONFIG_FILE: &str = "storefront";

/// Where logins are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthBackendKind {
    /// Pick `database` when it is usable, else `mock`.
    Auto,
    /// Accounts in the `users` table, argon2 hashes.
    Database,
    /// Fixed demo accounts plus in-process registrations.
    Mock,
}

impl Default for AuthBackendKind {
    fn default() -> Self {
        AuthBackendKind::Auto
    }
}

/// Storefront API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Bind address
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite file, or `:memory:`
    pub database_path: String,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// JWT access token lifetime in seconds
    pub jwt_access_lifetime_secs: i64,

    /// JWT refresh token lifetime in seconds
    pub jwt_refresh_lifetime_secs: i64,

    pub auth_backend: AuthBackendKind,

    /// Sales tax in basis points
    pub tax_rate_bps: u32,

    /// Allowed browser origin. `None` allows any.
    pub cors_origin: Option<String>,

    /// Load the demo catalog into an empty database at startup
    pub seed_demo_data: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_path: "./foodie.db".to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_access_lifetime_secs: 3600,     // 1 hour
            jwt_refresh_lifetime_secs: 604_800, // 7 days
            auth_backend: AuthBackendKind::Auto,
            tax_rate_bps: DEFAULT_TAX_RATE_BPS,
            cors_origin: None,
            seed_demo_data: false,
        }
    }
}

impl ApiConfig {
    /// Load configuration from defaults, `storefront.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_sources(File::with_name(CONFIG_FILE).required(false))
    }

    /// Load configuration with TOML text in place of the config file.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        Self::from_sources(File::from_str(toml, FileFormat::Toml))
    }

    fn from_sources<S>(file: S) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let defaults = ApiConfig::default();

        let config: ApiConfig = Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("database_path", defaults.database_path)?
            .set_default("jwt_secret", defaults.jwt_secret)?
            .set_default("jwt_access_lifetime_secs", defaults.jwt_access_lifetime_secs)?
            .set_default("jwt_refresh_lifetime_secs", defaults.jwt_refresh_lifetime_secs)?
            .set_default("auth_backend", "auto")?
            .set_default("tax_rate_bps", i64::from(defaults.tax_rate_bps))?
            .set_default("seed_demo_data", defaults.seed_demo_data)?
            .add_source(file)
            .add_source(Environment::with_prefix("FOODIE").try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Checks values the deserializer cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt_secret".to_string()));
        }

        if self.jwt_access_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("jwt_access_lifetime_secs".to_string()));
        }

        if self.jwt_refresh_lifetime_secs < self.jwt_access_lifetime_secs {
            return Err(ConfigError::InvalidValue("jwt_refresh_lifetime_secs".to_string()));
        }

        if self.tax_rate_bps > 10_000 {
            return Err(ConfigError::InvalidValue("tax_rate_bps".to_string()));
        }

        if self.auth_backend == AuthBackendKind::Database && !self.database_auth_usable() {
            return Err(ConfigError::DatabaseAuthUnavailable);
        }

        Ok(())
    }

    /// The backend `auto` settles on.
    pub fn resolved_auth_backend(&self) -> AuthBackendKind {
        match self.auth_backend {
            AuthBackendKind::Auto if self.database_auth_usable() => AuthBackendKind::Database,
            AuthBackendKind::Auto => AuthBackendKind::Mock,
            explicit => explicit,
        }
    }

    /// A real database file and a non-default secret.
    fn database_auth_usable(&self) -> bool {
        let path = self.database_path.trim();
        !path.is_empty() && path != ":memory:" && self.jwt_secret != DEV_JWT_SECRET
    }

    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Database auth needs a database file and a non-default jwt_secret")]
    DatabaseAuthUnavailable,

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}
