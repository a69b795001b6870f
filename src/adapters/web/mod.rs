//! Web server adapter.
//!
//! Axum server with an htmx frontend: the page holds the query form and a
//! chart fragment that re-polls the server on the refresh interval.

mod error;
mod handlers;
mod templates;

pub use error::WebError;
pub use handlers::*;
pub use templates::*;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::adapters::refresh_service::RefreshService;

pub struct AppState {
    pub refresh: RefreshService,
    pub rsi_period: usize,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::dashboard))
        .route("/chart", get(handlers::chart))
        .route("/query", post(handlers::update_query))
        .route("/refresh", post(handlers::refresh))
        .route("/api/candles", get(handlers::candles_json))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

fn is_htmx_request(headers: &axum::http::HeaderMap) -> bool {
    headers.get("HX-Request").is_some()
}
