use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with all codetree endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route(
            "/v1/code-tree",
            get(handler::get_codes)
                .put(handler::put_codes)
                .delete(handler::delete_codes),
        )
        .route("/v1/code-tree/check", get(handler::check_codes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
