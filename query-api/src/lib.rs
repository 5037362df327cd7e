//! HTTP front end for the query engine: axum routes, request/response DTOs,
//! CORS, error-to-HTTP mapping, content enrichment, and lineage resolution.

pub mod config;
pub mod core;
pub mod enrichment;
pub mod error;
pub mod lineage;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::post;
use tower_http::cors::{AllowOrigin, CorsLayer};

pub use config::ServerConfig;
pub use core::app_state::AppState;

pub fn build_router(state: Arc<AppState>, server_config: &ServerConfig) -> Router {
    let cors = if server_config.cors_origins.is_empty() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = server_config.cors_origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(tower_http::cors::Any)
    };

    Router::new().route("/query", post(routes::query::query_route::query_route)).layer(cors).with_state(state)
}
