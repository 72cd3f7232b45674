//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Watcher endpoints are mounted under `/api/watchers` behind the rate
//! limiter; system endpoints live at the root.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod openapi;

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

/// Builds the complete API router with all REST endpoints.
pub fn build_router(state: &AppState) -> Router<AppState> {
    let watchers = handlers::routes().route_layer(axum::middleware::from_fn_with_state(
        state.clone(),
        middleware::rate_limit,
    ));

    let router = Router::new()
        .nest("/api/watchers", watchers)
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa::OpenApi;
        router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
    };

    router
}

/// Builds the served application: routes, state, and transport layers.
pub fn build_app(state: AppState, request_timeout: Duration) -> Router {
    build_router(&state)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
