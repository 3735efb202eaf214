pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::cloud::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let static_dir = ServeDir::new(&state.config.static_dir);
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/health", get(health::health_handler))
        // Upload page
        .route(
            "/",
            get(handlers::handle_index).post(handlers::handle_upload_page),
        )
        // JSON API
        .route("/api/v1/wordcloud", post(handlers::handle_generate))
        .nest_service("/static", static_dir)
        .layer(body_limit)
        .with_state(state)
}
