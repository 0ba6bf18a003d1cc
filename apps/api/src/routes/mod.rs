pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::shortlist::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Shortlisting
        .route(
            "/candidates/analyze-and-shortlist",
            post(handlers::handle_analyze_and_shortlist),
        )
        .route("/candidates/shortlist", get(handlers::handle_list_shortlist))
        .route(
            "/candidates/:id/shortlist",
            get(handlers::handle_get_shortlist),
        )
        .with_state(state)
}
