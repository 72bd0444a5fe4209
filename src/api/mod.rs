// src/api/mod.rs
// HTTP surface: problem routes plus health

pub mod error;
pub mod handlers;
pub mod problems;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub use error::{ApiError, ApiResult};

/// Create the web server router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/problems", get(problems::list_problems))
        .route("/problems/all", post(problems::run_all))
        // category slug on POST, problem id on GET
        .route(
            "/problems/{id}",
            get(problems::get_problem).post(problems::run_category),
        )
        .route("/problems/{id}/resolve", post(problems::resolve_problem))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
