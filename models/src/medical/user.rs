// models/src/medical/user.rs
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::HospitalResult;
use crate::roles::Role;

/// A staff account. Patients are not users; they are records owned by staff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn set_password(&mut self, password: &str) -> HospitalResult<()> {
        self.password_hash = hash(password, DEFAULT_COST)?;
        Ok(())
    }

    /// Constant-failure verification: an empty or malformed stored hash
    /// simply fails to verify.
    pub fn verify_password(&self, password: &str) -> bool {
        verify(password, &self.password_hash).unwrap_or(false)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 1,
            email: "dr.house@example.org".to_string(),
            password_hash: String::new(),
            first_name: "Gregory".to_string(),
            last_name: "House".to_string(),
            role: Role::Doctor,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn should_verify_a_set_password() {
        let mut user = sample_user();
        user.set_password("lupus-is-never-it").unwrap();
        assert!(user.verify_password("lupus-is-never-it"));
        assert!(!user.verify_password("vicodin"));
    }

    #[test]
    fn should_fail_verification_with_empty_hash() {
        let user = sample_user();
        assert!(!user.verify_password("anything"));
    }

    #[test]
    fn should_format_full_name() {
        assert_eq!(sample_user().full_name(), "Gregory House");
    }
}
