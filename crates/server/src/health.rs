use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::record_store::RecordStore;

#[derive(Clone)]
pub struct HealthState {
    store: Arc<dyn RecordStore>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub record_store: HealthCheck,
    pub checked_at: String,
}

impl HealthState {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

pub fn router(store: Arc<dyn RecordStore>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState::new(store))
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let record_store = record_store_check(state.store.as_ref());
    let ready = record_store.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "intake-server runtime initialized".to_string(),
        },
        record_store,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn record_store_check(store: &dyn RecordStore) -> HealthCheck {
    if store.is_configured() {
        HealthCheck { status: "ready", detail: "record store credentials configured".to_string() }
    } else {
        HealthCheck {
            status: "degraded",
            detail: "record store api key or base id missing".to_string(),
        }
    }
}
