// lib/src/config/mod.rs
//! Configuration: YAML file (optional) with environment overrides.

pub mod config_defaults;
pub mod config_structs;

use std::env;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde_yaml2 as serde_yaml;

use models::{HospitalError, HospitalResult};

pub use config_defaults::*;
pub use config_structs::{
    HospitalConfig, MailConfig, SchedulingConfig, StorageConfig, StorageEngineType,
};

/// Loads configuration. Precedence: explicit path, `HOSPITAL_CONFIG`,
/// `hospital.yaml` in the working directory, built-in defaults. A missing
/// file falls back to defaults; a malformed file is a hard error.
pub fn load_hospital_config(path: Option<&Path>) -> HospitalResult<HospitalConfig> {
    let resolved: Option<PathBuf> = path
        .map(Path::to_path_buf)
        .or_else(|| env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from))
        .or_else(|| {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            default.exists().then_some(default)
        });

    let mut config = match resolved {
        Some(ref file) => {
            let raw = std::fs::read_to_string(file).map_err(|e| {
                HospitalError::Configuration(format!(
                    "cannot read config file {}: {}",
                    file.display(),
                    e
                ))
            })?;
            let parsed: HospitalConfig = serde_yaml::from_str(&raw).map_err(|e| {
                HospitalError::Configuration(format!(
                    "cannot parse config file {}: {}",
                    file.display(),
                    e
                ))
            })?;
            info!("loaded configuration from {}", file.display());
            parsed
        }
        None => {
            warn!("no configuration file found, using defaults");
            HospitalConfig::default()
        }
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

fn apply_env_overrides(config: &mut HospitalConfig) {
    if let Ok(name) = env::var(ENV_HOSPITAL_NAME) {
        config.hospital_name = name;
    }
    if let Ok(email) = env::var(ENV_ADMIN_EMAIL) {
        config.admin_email = email;
    }
    if let Ok(server) = env::var(ENV_MAIL_SERVER) {
        config.mail.server = Some(server);
    }
    if let Ok(sender) = env::var(ENV_MAIL_SENDER) {
        config.mail.default_sender = sender;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_a_partial_yaml_file() {
        let yaml = "hospital_name: County General\nstorage:\n  storage_engine_type: in-memory\n";
        let config: HospitalConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.hospital_name, "County General");
        assert_eq!(config.per_page, DEFAULT_PER_PAGE);
        assert_eq!(
            config.storage.storage_engine_type,
            StorageEngineType::InMemory
        );
    }

    #[test]
    fn should_default_the_mail_section() {
        let config = HospitalConfig::default();
        assert_eq!(config.mail.port, DEFAULT_MAIL_PORT);
        assert!(config.mail.use_tls);
    }
}
