use axum::{
    Router,
    routing::get,
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use crate::models::{AppState, ErrorResponse, SearchParams, SearchResponse};
use crate::types::AppError;
use tracing::{error, info};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/search", get(api_search))
        .with_state(state)
}

pub fn status_for(error: &AppError) -> StatusCode {
    match error {
        AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        AppError::EmbeddingRequest(_) | AppError::VectorQuery(_) => StatusCode::BAD_GATEWAY,
        AppError::EmbeddingUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status_for(&self), Json(body)).into_response()
    }
}

async fn api_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err(AppError::InvalidRequest("query must not be empty".to_string()));
    }

    info!(query = %query, "API search request");

    let matches = state.pipeline.search(query).await.map_err(|e| {
        error!(error = %e, "Search failed");
        e
    })?;

    Ok(Json(SearchResponse {
        query: query.to_string(),
        matches,
    }))
}
