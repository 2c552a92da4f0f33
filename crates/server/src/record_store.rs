//! Client for the hosted record store submissions are persisted in.
//!
//! The store speaks the Airtable REST shape: one `POST /v0/{base}/{table}`
//! creates records and answers with their ids. Creation is a single call; a
//! failure means no record exists.

use std::time::Duration;

use async_trait::async_trait;
use intake_core::config::RecordStoreConfig;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{info, warn};

/// Column name → value for one record.
pub type RecordFields = Map<String, Value>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatedRecord {
    pub id: String,
    pub created_time: Option<String>,
}

#[derive(Debug, Error)]
pub enum RecordStoreError {
    #[error("record store configuration missing: {0} is not set")]
    MissingConfiguration(&'static str),
    #[error("record store url is invalid: {0}")]
    InvalidUrl(String),
    #[error("record store request failed: {0}")]
    Http(#[source] reqwest::Error),
    #[error("record store rejected the record with status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("record store returned an unexpected response: {0}")]
    MalformedResponse(String),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Creates exactly one record in the configured table.
    async fn create_record(&self, fields: RecordFields) -> Result<CreatedRecord, RecordStoreError>;

    fn is_configured(&self) -> bool;
}

#[derive(Clone, Debug)]
pub struct AirtableRecordStore {
    client: Client,
    api_url: String,
    api_key: Option<SecretString>,
    base_id: Option<String>,
    table: String,
}

#[derive(Debug, Deserialize)]
struct CreateRecordsResponse {
    records: Vec<RecordEnvelope>,
}

#[derive(Debug, Deserialize)]
struct RecordEnvelope {
    id: String,
    #[serde(rename = "createdTime")]
    created_time: Option<String>,
}

impl AirtableRecordStore {
    pub fn from_config(config: &RecordStoreConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            base_id: config.base_id.clone(),
            table: config.table.clone(),
        })
    }

    fn credentials(&self) -> Result<(&str, &str), RecordStoreError> {
        let api_key = self
            .api_key
            .as_ref()
            .map(|key| key.expose_secret())
            .filter(|key| !key.trim().is_empty())
            .ok_or(RecordStoreError::MissingConfiguration("record_store.api_key"))?;
        let base_id = self
            .base_id
            .as_deref()
            .filter(|base| !base.trim().is_empty())
            .ok_or(RecordStoreError::MissingConfiguration("record_store.base_id"))?;
        Ok((api_key, base_id))
    }

    fn table_url(&self, base_id: &str) -> Result<Url, RecordStoreError> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|error| RecordStoreError::InvalidUrl(error.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| RecordStoreError::InvalidUrl(self.api_url.clone()))?
            .pop_if_empty()
            .extend(["v0", base_id, self.table.as_str()]);
        Ok(url)
    }
}

#[async_trait]
impl RecordStore for AirtableRecordStore {
    async fn create_record(&self, fields: RecordFields) -> Result<CreatedRecord, RecordStoreError> {
        let (api_key, base_id) = self.credentials()?;
        let url = self.table_url(base_id)?;

        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(&json!({ "records": [{ "fields": fields }], "typecast": true }))
            .send()
            .await
            .map_err(RecordStoreError::Http)?;

        let status = response.status();
        let body = response.text().await.map_err(RecordStoreError::Http)?;

        if !status.is_success() {
            let message = api_error_message(&body);
            warn!(
                event_name = "intake.record_store.rejected",
                status = status.as_u16(),
                table = %self.table,
                message = %message,
                "record store rejected record creation"
            );
            return Err(RecordStoreError::Api { status: status.as_u16(), message });
        }

        let parsed: CreateRecordsResponse = serde_json::from_str(&body)
            .map_err(|error| RecordStoreError::MalformedResponse(error.to_string()))?;
        let record = parsed.records.into_iter().next().ok_or_else(|| {
            RecordStoreError::MalformedResponse("response contained no records".to_string())
        })?;

        info!(
            event_name = "intake.record_store.created",
            record_id = %record.id,
            table = %self.table,
            "record created"
        );

        Ok(CreatedRecord { id: record.id, created_time: record.created_time })
    }

    fn is_configured(&self) -> bool {
        self.credentials().is_ok()
    }
}

/// Pulls a readable message out of either `{"error":{"message":..}}` or
/// `{"error":"TYPE"}`; falls back to the raw body.
fn api_error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let error = parsed.as_ref().and_then(|value| value.get("error"));

    match error {
        Some(Value::String(kind)) => kind.clone(),
        Some(Value::Object(details)) => {
            let kind = details.get("type").and_then(Value::as_str);
            let message = details.get("message").and_then(Value::as_str);
            match (kind, message) {
                (Some(kind), Some(message)) => format!("{kind}: {message}"),
                (None, Some(message)) => message.to_string(),
                (Some(kind), None) => kind.to_string(),
                (None, None) => body.trim().to_string(),
            }
        }
        _ => body.trim().to_string(),
    }
}
