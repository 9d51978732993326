use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::warn;

use crate::state::SharedState;

/// Liveness, a database round trip and whether the schema is current.
pub async fn health(State(state): State<SharedState>) -> (StatusCode, Json<Value>) {
    let database = state.db.health_check().await;

    let schema = match state.db.schema_status().await {
        Ok(schema) => Some(schema),
        Err(e) => {
            warn!(error = %e, "Health check: schema status unavailable");
            None
        }
    };

    if !database {
        warn!("Health check: database unreachable");
    }

    let healthy = database && schema.is_some_and(|s| s.is_current());
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if healthy { "ok" } else { "degraded" },
            "database": database,
            "schema": schema,
            "authBackend": state.accounts.kind(),
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}
