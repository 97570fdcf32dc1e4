//! # Messenger Gateway Crate
//!
//! HTTP surface of the Messenger backend. Handlers authenticate the bearer
//! token, call into `messenger-auth` and `messenger-chats`, and map their
//! errors onto HTTP status codes.
//!
//! All application routes live under `/api/v1`; `/health` and
//! `/api-docs/openapi.json` are unauthenticated.

pub mod docs;
pub mod error;
pub mod middleware;
pub mod rest;
pub mod state;

pub use error::{ErrorResponse, GatewayError, GatewayResult};
pub use middleware::{logging_middleware, require_bearer};
pub use state::GatewayState;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware as axum_middleware,
    routing::get,
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;

/// Create the application router with all routes and layers.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(rest::health::health_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api/v1", rest::create_rest_routes())
        .with_state(state)
        .layer(cors_layer())
        .layer(middleware::create_trace_layer())
        .layer(axum_middleware::from_fn(logging_middleware))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(docs::ApiDoc::openapi())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}
