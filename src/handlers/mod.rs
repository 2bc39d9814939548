pub mod health;
pub mod metadata;

pub use health::*;
pub use metadata::*;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::logging_middleware;
use crate::state::AppState;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_file_size_bytes() + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/api/v1/metadata", post(metadata_handler))
        .route("/api/v1/metadata/json", post(metadata_json_handler))
        .route("/api/v1/metadata/csv", post(metadata_csv_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(axum::middleware::from_fn(logging_middleware))
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}
