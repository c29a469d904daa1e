use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::app_state::AppState;
use crate::db::recipe_queries;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub database: ComponentHealth,
}

#[derive(Serialize)]
pub struct ComponentHealth {
    pub status: String,
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_recipes: Option<i64>,
}

/// GET /health — cache database connectivity and size.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let start = std::time::Instant::now();

    let db_check = match state.db.acquire().await {
        Ok(mut conn) => match recipe_queries::count_recipes(&mut conn).await {
            Ok(count) => ComponentHealth {
                status: "ok".to_string(),
                latency_ms: Some(start.elapsed().as_millis() as u64),
                cached_recipes: Some(count),
            },
            Err(e) => {
                tracing::warn!(error = %e, "Health check query failed");
                ComponentHealth {
                    status: "error".to_string(),
                    latency_ms: None,
                    cached_recipes: None,
                }
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not acquire a connection");
            ComponentHealth {
                status: "error".to_string(),
                latency_ms: None,
                cached_recipes: None,
            }
        }
    };

    let healthy = db_check.status == "ok";
    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if healthy { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks { database: db_check },
    };

    (status_code, Json(response))
}
