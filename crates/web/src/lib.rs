use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod handlers;
pub mod state;

pub use error::WebError;
pub use state::AppState;

/// `/archive` and `/article/:date`; every other path serves the latest article.
/// Only `GET` is routed, so other methods answer 405 on any path.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::latest))
        .route("/archive", get(handlers::archive))
        .route("/article/:date", get(handlers::article_by_date))
        .fallback(get(handlers::latest))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}
