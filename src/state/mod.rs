use crate::config::Config;
use crate::extractors::TokenVerifier;
use crate::services::{DeviceService, DeviceStore, SqliteDeviceStore};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub device_service: Arc<DeviceService>,
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    pub fn build(config: &Config, pool: SqlitePool) -> Self {
        Self::with_store(config, Arc::new(SqliteDeviceStore::new(pool)))
    }

    pub fn with_store(config: &Config, store: Arc<dyn DeviceStore>) -> Self {
        Self {
            device_service: Arc::new(DeviceService::new(store)),
            verifier: Arc::new(TokenVerifier::new(&config.authorize)),
        }
    }
}
