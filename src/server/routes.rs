//! Router configuration for the HTTP façade.

use std::time::Duration;

use axum::{
    http::{header, Method},
    routing::{delete, get},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use super::handlers;
use super::AppState;

/// Preflight results may be cached this long.
const CORS_MAX_AGE: Duration = Duration::from_secs(12 * 60 * 60);

/// CORS for the configured browser frontends.
fn cors_layer(state: &AppState) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(state.allowed_origins.iter().cloned()))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
        .expose_headers([header::CONTENT_LENGTH])
        .allow_credentials(true)
        .max_age(CORS_MAX_AGE)
}

/// Create the router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state);

    Router::new()
        .route(
            "/links",
            get(handlers::list_links)
                .post(handlers::add_links)
                .put(handlers::update_link),
        )
        .route("/links/:id", delete(handlers::delete_link))
        .layer(cors)
        .with_state(state)
}
