//! API module
//!
//! HTTP API endpoints and middleware.

pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::{http::StatusCode, Json, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::ErrorResponse;
use crate::handlers::AccountNumberGenerator;
use crate::store::AccountStore;

pub use routes::create_router;

/// Shared state handed to every route
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AccountStore>,
    pub generator: AccountNumberGenerator,
}

impl AppState {
    pub fn new(store: Arc<dyn AccountStore>, generator: AccountNumberGenerator) -> Self {
        Self { store, generator }
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/v1", create_router())
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// JSON 404 for unknown routes
async fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Endpoint not found".to_string(),
            error_code: "endpoint_not_found".to_string(),
            details: None,
            errors: Vec::new(),
        }),
    )
}
