use axum::{Json, Router, middleware, routing::get};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use scanlearn_core::AppError;
use scanlearn_observability::logging_middleware;

use crate::middleware::access::access_gate;
use crate::state::AppState;

/// Wraps `api` in the access gate and mounts it under `/api`.
///
/// The gate is a regular layer rather than a route layer, so it also runs for
/// paths no handler matches.
pub fn init_router(state: AppState, api: Router<AppState>) -> Router {
    Router::new()
        .nest("/api", api)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), access_gate))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Routes served by this binary; feature routers are merged in by the caller.
pub fn init_api_router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn not_found() -> AppError {
    AppError::not_found("Not found")
}
