// lib/src/database.rs
use std::sync::Arc;

use log::info;

use models::HospitalResult;

use crate::config::{StorageConfig, StorageEngineType};
use crate::storage_engine::{HospitalStorageEngine, InMemoryStorage};

/// Handle to the configured storage engine. Cheap to clone; every service
/// holds one.
#[derive(Clone, Debug)]
pub struct Database {
    pub storage: Arc<dyn HospitalStorageEngine>,
    pub config: StorageConfig,
}

impl Database {
    pub async fn new(config: StorageConfig) -> HospitalResult<Self> {
        let storage: Arc<dyn HospitalStorageEngine> = match config.storage_engine_type {
            StorageEngineType::InMemory => Arc::new(InMemoryStorage::new()),
        };
        info!(
            "opened {} storage engine",
            config.storage_engine_type.as_str()
        );
        Ok(Database { storage, config })
    }

    /// Fresh in-memory database; the workhorse for tests.
    pub fn in_memory() -> Self {
        Database {
            storage: Arc::new(InMemoryStorage::new()),
            config: StorageConfig::default(),
        }
    }
}
