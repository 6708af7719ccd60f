// lib/src/config/config_defaults.rs

pub const DEFAULT_HOSPITAL_NAME: &str = "Hospital Manager";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
pub const DEFAULT_CONFIG_PATH: &str = "hospital.yaml";
pub const DEFAULT_PER_PAGE: usize = 10;
pub const DEFAULT_MAIL_PORT: u16 = 587;
pub const DEFAULT_MAIL_SENDER: &str = "noreply@example.com";

// Appointment slots run 9:00 to 18:00 in 30 minute steps.
pub const DEFAULT_SLOT_MINUTES: u32 = 30;
pub const DEFAULT_DAY_START_HOUR: u32 = 9;
pub const DEFAULT_DAY_END_HOUR: u32 = 18;

/// Environment variables recognized by the loader, overriding file values.
pub const ENV_HOSPITAL_NAME: &str = "HOSPITAL_NAME";
pub const ENV_ADMIN_EMAIL: &str = "ADMIN_EMAIL";
pub const ENV_MAIL_SERVER: &str = "MAIL_SERVER";
pub const ENV_MAIL_SENDER: &str = "MAIL_DEFAULT_SENDER";
pub const ENV_CONFIG_PATH: &str = "HOSPITAL_CONFIG";
