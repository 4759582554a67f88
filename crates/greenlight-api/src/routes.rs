//! API routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::analysis::{get_ingest_status, upload_screenplay};
use crate::handlers::export::export_csv;
use crate::handlers::screenplays::{
    get_dimensions, get_screenplay, list_screenplays, reload_catalog,
};
use crate::handlers::{health, ready};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
    RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let screenplay_routes = Router::new()
        .route("/screenplays", get(list_screenplays))
        .route("/screenplays/reload", post(reload_catalog))
        .route("/screenplays/:id", get(get_screenplay))
        .route("/screenplays/:id/dimensions", get(get_dimensions));

    let analysis_routes = Router::new()
        .route("/analyze", post(upload_screenplay))
        .route("/analyze/:job_id/status", get(get_ingest_status));

    let export_routes = Router::new().route("/export/csv", get(export_csv));

    let rate_limiter = std::sync::Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = Router::new()
        .merge(screenplay_routes)
        .merge(analysis_routes)
        .merge(export_routes)
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        // Body limit bounds PDF upload size
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
