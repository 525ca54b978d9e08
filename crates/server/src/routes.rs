//! Route configuration.

use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/v1/health", get(handlers::health_check))
        // Matrix discovery
        .route("/v1/matrices", get(handlers::list_matrices))
        .route("/v1/matrices/{table}", get(handlers::get_table_info))
        // Genes
        .route("/v1/genes/search", get(handlers::search_genes))
        .route(
            "/v1/genes/{gene_id}/expression",
            get(handlers::get_expression),
        )
        .route(
            "/v1/genes/{gene_id}/transcripts",
            get(handlers::get_transcripts),
        )
        .route("/v1/genes/{gene_id}/summary", get(handlers::get_summary))
        // Admin
        .route("/v1/admin/cache/clear", post(handlers::clear_cache));

    let mut router = Router::new().merge(api_routes);

    // The metrics endpoint is unauthenticated; restrict it at the network level.
    if state.config.server.metrics_enabled {
        router = router.route("/metrics", get(metrics_handler));
    }

    router
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
