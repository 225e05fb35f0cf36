//! HTTP API for the bookshelf catalog.
//!
//! [`app`] assembles the router; the binary adds configuration, logging and the listener.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use bookshelf::backend::StoreBackend;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the application with request tracing.
pub fn app<B: StoreBackend + 'static>(state: AppState<B>) -> Router {
    routes::routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
