// Records endpoint - serves a dataset the way the viewer expects to fetch it

use crate::record::{Record, RecordId};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct ApiState {
    records: Arc<Vec<Record>>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Serialize)]
struct CategoryStat {
    category: String,
    count: usize,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check(State(state): State<ApiState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.records.len()))
}

/// GET /sights - The full record list as a bare JSON array
async fn list_sights(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.records.as_ref().clone())
}

/// GET /sights/:id - One record
async fn get_sight(State(state): State<ApiState>, Path(id): Path<RecordId>) -> impl IntoResponse {
    match state.records.iter().find(|r| r.id == id) {
        Some(record) => (StatusCode::OK, Json(ApiResponse::ok(record.clone()))).into_response(),
        None => {
            tracing::debug!(id, "record not found");
            (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<Record>::err(format!("No record with id {}", id))),
            )
                .into_response()
        }
    }
}

/// GET /api/categories - Record counts per category, in first-seen order
async fn get_categories(State(state): State<ApiState>) -> impl IntoResponse {
    let mut stats: Vec<CategoryStat> = Vec::new();
    for category in state.records.iter().filter_map(|r| r.category.as_deref()) {
        match stats.iter_mut().find(|s| s.category == category) {
            Some(stat) => stat.count += 1,
            None => stats.push(CategoryStat {
                category: category.to_string(),
                count: 1,
            }),
        }
    }

    Json(ApiResponse::ok(stats))
}

pub fn router(records: Vec<Record>) -> Router {
    let state = ApiState {
        records: Arc::new(records),
    };

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/categories", get(get_categories))
        .with_state(state.clone());

    Router::new()
        .route("/sights", get(list_sights))
        .route("/sights/:id", get(get_sight))
        .with_state(state)
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
