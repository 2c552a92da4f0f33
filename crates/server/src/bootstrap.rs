use std::sync::Arc;

use intake_core::config::{AppConfig, ConfigError, LoadOptions};
use thiserror::Error;
use tracing::{info, warn};

use crate::record_store::{AirtableRecordStore, RecordStore};

pub struct Application {
    pub config: AppConfig,
    pub record_store: Arc<dyn RecordStore>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("record store client could not be built: {0}")]
    RecordStoreClient(#[source] reqwest::Error),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let store = AirtableRecordStore::from_config(&config.record_store)
        .map_err(BootstrapError::RecordStoreClient)?;

    if store.is_configured() {
        info!(
            event_name = "system.bootstrap.record_store_ready",
            correlation_id = "bootstrap",
            table = %config.record_store.table,
            "record store client configured"
        );
    } else {
        warn!(
            event_name = "system.bootstrap.record_store_unconfigured",
            correlation_id = "bootstrap",
            "record store api key or base id missing; submissions will fail until configured"
        );
    }

    Ok(Application { config, record_store: Arc::new(store) })
}
