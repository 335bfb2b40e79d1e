//! HTTP application assembly.
//!
//! Merges the API routers, serves static assets for everything else and
//! wraps the whole tree in the admin route guard.

use axum::{Router, middleware};
use tower_http::compression::{CompressionLayer, CompressionLevel};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::core::auth::{AuthApiState, GuardState, auth_api_router, route_guard};
use crate::core::products::{ProductApiState, product_api_router};

/// Build the application router
pub fn build_router(auth: AuthApiState, products: ProductApiState, site_root: &str) -> Router {
    let guard = GuardState::new(auth.auth_service.sessions().clone());

    let assets = ServeDir::new(site_root)
        .precompressed_br()
        .precompressed_gzip();

    Router::new()
        .merge(auth_api_router(auth))
        .merge(product_api_router(products))
        .fallback_service(assets)
        // Added after the routes and fallback so it sees every request
        .layer(middleware::from_fn_with_state(guard, route_guard))
        .layer(TraceLayer::new_for_http())
        .layer(
            CompressionLayer::new()
                .br(true)
                .gzip(true)
                .quality(CompressionLevel::Default),
        )
}
