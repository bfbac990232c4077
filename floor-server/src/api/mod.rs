//! HTTP API
//!
//! | Module | Routes |
//! |--------|--------|
//! | [`health`] | `GET /health` |
//! | [`orders`] | `/api/orders` |
//! | [`work_orders`] | `/api/work-orders` |
//! | [`dashboard`] | `GET /api/dashboard` |
//! | [`downtime`] | `/api/downtime` |
//! | [`ws`] | `GET /ws` observer socket |
//!
//! Successful calls return the entity as a plain JSON body; failures render
//! the [`ApiResponse`](shared::error::ApiResponse) envelope. Unknown routes
//! get the envelope too (`NotFound`, 404).

pub mod dashboard;
pub mod downtime;
pub mod extract;
pub mod health;
pub mod orders;
pub mod work_orders;
pub mod ws;

use axum::{Router, middleware};
use tower_http::cors::CorsLayer;

use crate::core::ServerState;
use crate::utils::logger::ACCESS_TARGET;

pub use crate::utils::{AppError, AppResult};

/// HTTP access log middleware
async fn log_request(
    request: http::Request<axum::body::Body>,
    next: middleware::Next,
) -> http::Response<axum::body::Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = std::time::Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        target: ACCESS_TARGET,
        method = %method,
        uri = %uri,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "{} {} {}",
        method,
        uri,
        response.status()
    );

    response
}

/// Routes without state
pub fn routes() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(work_orders::router())
        .merge(dashboard::router())
        .merge(downtime::router())
        .merge(ws::router())
        .fallback(unknown_route)
}

async fn unknown_route(uri: http::Uri) -> AppError {
    AppError::not_found(format!("Route {}", uri.path()))
}

/// Full application with state and middleware
pub fn build_app(state: ServerState) -> Router {
    routes()
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(log_request))
}
