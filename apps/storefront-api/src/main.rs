//! # Storefront API
//!
//! JSON REST server for the Foodie storefront.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Storefront API Server                            │
//! │                                                                         │
//! │  Browser ───► HTTP (3000) ───► Handlers ───► SQLite                     │
//! │                                    │                                    │
//! │                                    ▼                                    │
//! │                               foodie-core                               │
//! │                           (pricing, promotions)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use foodie_db::seed::seed_demo_data;
use foodie_db::{Database, DbConfig};
use storefront_api::config::AuthBackendKind;
use storefront_api::{build_router, ApiConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,storefront_api=debug")),
        )
        .with_target(true)
        .init();

    info!("Starting Foodie storefront API...");

    // Load configuration
    let config = ApiConfig::load().context("Failed to load configuration")?;
    let auth_backend = config.resolved_auth_backend();
    info!(
        port = config.port,
        database = %config.database_path,
        auth_backend = ?auth_backend,
        "Configuration loaded"
    );

    if auth_backend == AuthBackendKind::Mock {
        warn!("Using mock accounts; registrations last only until restart");
    }

    // Connect to database (migrations run on connect)
    let db = Database::new(DbConfig::new(&config.database_path))
        .await
        .context("Failed to open database")?;
    info!("Database ready");

    if config.seed_demo_data {
        match seed_demo_data(&db).await? {
            Some(summary) => info!(
                restaurants = summary.restaurants,
                menu_items = summary.menu_items,
                "Demo data seeded"
            ),
            None => info!("Database already populated, skipping seed"),
        }
    }

    let addr = config.bind_addr();
    let state = AppState::new(db.clone(), config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "Starting HTTP server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
