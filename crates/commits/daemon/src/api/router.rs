//! API Router configuration

use super::handlers;
use super::state::AppState;
use crate::config::ServerConfig;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let router = Router::new()
        .route("/health", get(handlers::health_check))
        // Commitments, grouped by user
        .route(
            "/promises",
            get(handlers::list_promises).delete(handlers::clear_promises),
        )
        .route("/promises/:user", get(handlers::list_user_promises))
        .route("/promises/create/*address", post(handlers::create_promise))
        .route("/promise/*address", get(handlers::get_promise))
        // Single records by id
        .route("/commitments/:id", delete(handlers::delete_commitment))
        .route("/commitments/:id/complete", post(handlers::complete_commitment))
        .route("/standings", get(handlers::standings))
        .layer(TimeoutLayer::new(Duration::from_secs(
            server.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http());

    let router = if server.enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.with_state(state)
}
