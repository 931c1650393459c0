//! PDF Sign Server Library
//!
//! Stamps a short signature line (signer initials or a fixed label) onto
//! every page of an uploaded PDF. The main server binary is in main.rs.
//!
//! # Modules
//!
//! - `stamp`: Page-overlay stamping (lopdf backend, Helvetica metrics)
//! - `routes`: HTTP endpoints
//! - `config`: Environment-driven configuration

pub mod config;
pub mod error;
pub mod routes;
pub mod stamp;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the full application router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = state.config().server.max_upload_bytes;

    Router::new()
        .merge(routes::health::router())
        .merge(routes::sign::router())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
