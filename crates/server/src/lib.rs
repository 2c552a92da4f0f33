//! Intake server: accepts agent configuration submissions from the browser
//! form and stores each one as a record in the hosted record store.

pub mod bootstrap;
pub mod health;
pub mod record_store;
pub mod submission;

use std::sync::Arc;

use axum::{extract::Request, Router};
use tower_http::trace::TraceLayer;
use tracing::info_span;

use crate::record_store::RecordStore;

/// Full HTTP surface: the submission endpoint plus `/health`.
pub fn app_router(store: Arc<dyn RecordStore>) -> Router {
    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        info_span!("http_request", method = %request.method(), uri = %request.uri())
    });

    Router::new()
        .merge(submission::router(store.clone()))
        .merge(health::router(store))
        .layer(trace_layer)
}
