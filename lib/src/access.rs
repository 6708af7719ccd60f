// lib/src/access.rs
//! The role-access gate. Every workflow operation takes an [`AuthContext`]
//! as an explicit parameter and calls [`AuthContext::require`] before doing
//! anything else; there is no ambient current-user state.

use serde::{Deserialize, Serialize};

use models::medical::User;
use models::roles::{Capability, Role};
use models::{HospitalError, HospitalResult};

/// The authenticated identity attached to a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: i32,
    pub role: Role,
    pub is_active: bool,
    pub full_name: String,
}

impl AuthContext {
    pub fn from_user(user: &User) -> Self {
        AuthContext {
            user_id: user.id,
            role: user.role,
            is_active: user.is_active,
            full_name: user.full_name(),
        }
    }

    /// Allows or denies one operation. Deactivated identities are denied
    /// everything regardless of role.
    pub fn require(&self, capability: Capability) -> HospitalResult<()> {
        if !self.is_active {
            return Err(HospitalError::PermissionDenied(
                "your account has been deactivated".to_string(),
            ));
        }
        if !self.role.has_capability(capability) {
            return Err(HospitalError::PermissionDenied(format!(
                "a {} may not {}",
                self.role,
                capability.describe()
            )));
        }
        Ok(())
    }
}
