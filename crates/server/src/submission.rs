//! `POST /api/submit-form`: validates an agent configuration submission and
//! stores it as one record.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderName, Method, StatusCode},
    routing::post,
    Json, Router,
};
use intake_core::domain::submission::SUCCESS_MESSAGE;
use intake_core::{SubmissionAccepted, SubmissionFailure, SubmissionPayload};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::record_store::{RecordFields, RecordStore, RecordStoreError};

pub const SUBMIT_PATH: &str = "/api/submit-form";

const ALLOWED_METHODS: [Method; 6] =
    [Method::GET, Method::OPTIONS, Method::PATCH, Method::DELETE, Method::POST, Method::PUT];

const ALLOWED_HEADERS: [&str; 9] = [
    "x-csrf-token",
    "x-requested-with",
    "accept",
    "accept-version",
    "content-length",
    "content-md5",
    "content-type",
    "date",
    "x-api-version",
];

type Rejection = (StatusCode, Json<SubmissionFailure>);

#[derive(Clone)]
pub struct SubmissionState {
    store: Arc<dyn RecordStore>,
}

impl SubmissionState {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

pub fn router(store: Arc<dyn RecordStore>) -> Router {
    Router::new()
        .route(SUBMIT_PATH, post(submit_form).options(preflight).fallback(method_not_allowed))
        .layer(cors_layer())
        .with_state(SubmissionState::new(store))
}

/// Browsers call the endpoint cross-origin, so every origin is allowed.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers(ALLOWED_HEADERS.map(HeaderName::from_static))
}

pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed(method: Method) -> Rejection {
    warn!(
        event_name = "intake.submission.method_not_allowed",
        method = %method,
        "submission endpoint called with unsupported method"
    );
    (StatusCode::METHOD_NOT_ALLOWED, Json(SubmissionFailure::new("Method not allowed")))
}

pub async fn submit_form(
    State(state): State<SubmissionState>,
    body: Bytes,
) -> Result<(StatusCode, Json<SubmissionAccepted>), Rejection> {
    let correlation_id = Uuid::new_v4().to_string();
    info!(
        event_name = "intake.submission.received",
        correlation_id = %correlation_id,
        body_bytes = body.len(),
        "agent configuration submission received"
    );

    let payload: SubmissionPayload = serde_json::from_slice(&body).map_err(|parse_error| {
        warn!(
            event_name = "intake.submission.rejected",
            correlation_id = %correlation_id,
            reason = "invalid_body",
            error = %parse_error,
            "submission body is not valid JSON"
        );
        let failure = SubmissionFailure::new("Invalid request body");
        (StatusCode::BAD_REQUEST, Json(failure.with_error(parse_error.to_string())))
    })?;

    let missing = payload.missing_required_fields();
    if !missing.is_empty() {
        let missing_fields: Vec<String> =
            missing.iter().map(|field| field.payload_key().to_string()).collect();
        warn!(
            event_name = "intake.submission.rejected",
            correlation_id = %correlation_id,
            reason = "missing_required_fields",
            missing_fields = ?missing_fields,
            "submission is missing required fields"
        );
        return Err((
            StatusCode::BAD_REQUEST,
            Json(SubmissionFailure {
                missing_fields: Some(missing_fields),
                ..SubmissionFailure::new("Missing required fields")
            }),
        ));
    }

    let fields = record_fields(&payload);
    let record = state.store.create_record(fields).await.map_err(|store_error| {
        error!(
            event_name = "intake.submission.failed",
            correlation_id = %correlation_id,
            error = %store_error,
            "record store call failed"
        );
        let message = match store_error {
            RecordStoreError::MissingConfiguration(_) => "Record store configuration missing",
            _ => "Error submitting form",
        };
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(SubmissionFailure::new(message).with_error(store_error.to_string())),
        )
    })?;

    info!(
        event_name = "intake.submission.created",
        correlation_id = %correlation_id,
        record_id = %record.id,
        "agent configuration stored"
    );

    Ok((
        StatusCode::OK,
        Json(SubmissionAccepted { message: SUCCESS_MESSAGE.to_string(), record_id: record.id }),
    ))
}

/// Maps a validated payload onto the record store's columns. Absent optional
/// values become empty strings; absent functionalities an empty list.
pub fn record_fields(payload: &SubmissionPayload) -> RecordFields {
    let text = |value: &Option<String>| Value::String(value.clone().unwrap_or_default());

    let (report_crm, report_credentials) = if payload.reuses_source_crm() {
        (&payload.source_crm, &payload.source_crm_credentials)
    } else {
        (&payload.report_crm, &payload.report_crm_credentials)
    };

    let mut fields = RecordFields::new();
    fields.insert("Agent Type".to_string(), text(&payload.agent_type));
    fields.insert("Agent Name".to_string(), text(&payload.agent_name));
    fields.insert("Agent Gender".to_string(), text(&payload.agent_gender));
    fields.insert("Phone Number".to_string(), text(&payload.phone_number));
    fields.insert("Twilio Account SID".to_string(), text(&payload.account_sid));
    fields.insert("Knowledge Base Type".to_string(), text(&payload.knowledge_base_type));
    fields.insert("Knowledge Base Content".to_string(), text(&payload.knowledge_base_content));
    fields.insert(
        "Functionalities".to_string(),
        json!(payload.functionalities.clone().unwrap_or_default()),
    );
    fields.insert("Source CRM".to_string(), text(&payload.source_crm));
    fields.insert("Source CRM Credentials".to_string(), text(&payload.source_crm_credentials));
    fields.insert("Report CRM".to_string(), text(report_crm));
    fields.insert("Report CRM Credentials".to_string(), text(report_credentials));
    fields.insert("Additional Notes".to_string(), text(&payload.additional_notes));
    fields
}
