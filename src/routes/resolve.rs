use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use garde::Validate;
use serde::Serialize;

use crate::app_state::AppState;
use crate::models::search::{SearchRequest, SearchResult};

#[derive(Debug, Serialize)]
pub struct ValidationErrorResponse {
    pub error: String,
    pub details: String,
}

/// POST /api/v1/resolve — resolve a cuisine, dish type and ingredient list
/// to a recipe, or explain why not.
///
/// Ordinary "no match" outcomes are a 200 with `status: "unresolved"`; only
/// malformed requests fail.
pub async fn resolve_recipe(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResult>, (StatusCode, Json<ValidationErrorResponse>)> {
    if let Err(report) = request.validate() {
        tracing::debug!(errors = %report, "Rejected invalid resolve request");
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ValidationErrorResponse {
                error: "invalid request".to_string(),
                details: report.to_string(),
            }),
        ));
    }

    Ok(Json(state.resolver.resolve(&request).await))
}
