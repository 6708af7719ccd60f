// lib/src/config/config_structs.rs
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::config_defaults::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageEngineType {
    InMemory,
}

impl StorageEngineType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageEngineType::InMemory => "in-memory",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub storage_engine_type: StorageEngineType,
    pub data_directory: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            storage_engine_type: StorageEngineType::InMemory,
            data_directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub server: Option<String>,
    pub port: u16,
    pub use_tls: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    pub default_sender: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        MailConfig {
            server: None,
            port: DEFAULT_MAIL_PORT,
            use_tls: true,
            username: None,
            password: None,
            default_sender: DEFAULT_MAIL_SENDER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    pub slot_minutes: u32,
    pub day_start_hour: u32,
    pub day_end_hour: u32,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        SchedulingConfig {
            slot_minutes: DEFAULT_SLOT_MINUTES,
            day_start_hour: DEFAULT_DAY_START_HOUR,
            day_end_hour: DEFAULT_DAY_END_HOUR,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HospitalConfig {
    pub hospital_name: String,
    pub admin_email: String,
    pub per_page: usize,
    pub storage: StorageConfig,
    pub mail: MailConfig,
    pub scheduling: SchedulingConfig,
}

impl Default for HospitalConfig {
    fn default() -> Self {
        HospitalConfig {
            hospital_name: DEFAULT_HOSPITAL_NAME.to_string(),
            admin_email: DEFAULT_ADMIN_EMAIL.to_string(),
            per_page: DEFAULT_PER_PAGE,
            storage: StorageConfig::default(),
            mail: MailConfig::default(),
            scheduling: SchedulingConfig::default(),
        }
    }
}
