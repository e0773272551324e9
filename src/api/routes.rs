use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Collaborator snapshots
        .route("/restaurants/:restaurant_id/catalog", put(handlers::put_catalog))
        .route("/restaurants/:restaurant_id/trends", put(handlers::put_trends))
        // Carts
        .route("/carts/:session_id", get(handlers::get_cart))
        .route("/carts/:session_id/items", post(handlers::add_item))
        // Recommendations
        .route("/carts/:session_id/recommendations", post(handlers::recommend))
        .route(
            "/carts/:session_id/recommendations/apply",
            post(handlers::apply_recommendation),
        )
}
