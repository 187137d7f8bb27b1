use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Readiness of the scoring service.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` when the database answers and its schema matches this build.
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Newest applied migration, `null` if the database is unmigrated or
    /// unreachable.
    pub schema_version: Option<i64>,
    /// Newest migration compiled into this binary.
    pub expected_schema_version: Option<i64>,
}

/// GET /health
///
/// A reachable database on an older schema is reported `degraded`.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = cxeval_db::health_check(&state.pool).await.is_ok();
    let schema_version = if db_healthy {
        match cxeval_db::applied_migration(&state.pool).await {
            Ok(version) => version,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read applied migration version");
                None
            }
        }
    } else {
        None
    };
    let expected_schema_version = cxeval_db::latest_migration();

    let status = if db_healthy && schema_version.is_some() && schema_version == expected_schema_version {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        schema_version,
        expected_schema_version,
    })
}

/// Mounted at the root, outside `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
