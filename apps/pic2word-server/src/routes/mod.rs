//! Route modules for pic2word server

pub mod convert;
pub mod health;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::middleware;
use crate::state::AppState;

/// Build the complete application router
pub fn app(state: AppState) -> Router {
    let cors = middleware::cors_layer(&state.config().allow_origins);
    let max_upload_bytes = state.config().max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", convert::router(max_upload_bytes))
        .layer(middleware::catch_panic_layer())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
