// lib/src/services/accounts.rs
//! Staff account administration and authentication.

use chrono::Utc;
use log::{info, warn};

use models::medical::User;
use models::roles::{Capability, Role};
use models::{HospitalError, HospitalResult, ValidationError};

use crate::access::AuthContext;
use crate::database::Database;

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub password: Option<String>,
}

#[derive(Clone, Debug)]
pub struct AccountService {
    db: Database,
}

impl AccountService {
    pub fn new(db: Database) -> Self {
        AccountService { db }
    }

    /// Verifies credentials and produces the identity every workflow
    /// operation takes as a parameter. Unknown email and bad password are
    /// indistinguishable to the caller.
    pub async fn authenticate(&self, email: &str, password: &str) -> HospitalResult<AuthContext> {
        let user = self
            .db
            .storage
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| HospitalError::Auth("invalid email or password".to_string()))?;
        if !user.verify_password(password) {
            return Err(HospitalError::Auth("invalid email or password".to_string()));
        }
        if !user.is_active {
            return Err(HospitalError::Auth(
                "your account has been deactivated, contact an administrator".to_string(),
            ));
        }
        info!("user {} authenticated as {}", user.email, user.role);
        Ok(AuthContext::from_user(&user))
    }

    pub async fn register_user(&self, ctx: &AuthContext, new: NewUser) -> HospitalResult<User> {
        ctx.require(Capability::ManageUsers)?;
        validate_email(&new.email)?;
        validate_password(&new.password)?;
        if new.first_name.trim().is_empty() {
            return Err(ValidationError::Required("first_name".to_string()).into());
        }
        if new.last_name.trim().is_empty() {
            return Err(ValidationError::Required("last_name".to_string()).into());
        }

        let mut user = User {
            id: 0,
            email: new.email,
            password_hash: String::new(),
            first_name: new.first_name,
            last_name: new.last_name,
            role: new.role,
            is_active: true,
            created_at: Utc::now(),
        };
        user.set_password(&new.password)?;
        self.db.storage.insert_user(user).await
    }

    /// Admin-gated edit. A user never changes their own role, admin or not.
    pub async fn update_user(
        &self,
        ctx: &AuthContext,
        user_id: i32,
        update: UserUpdate,
    ) -> HospitalResult<User> {
        ctx.require(Capability::ManageUsers)?;
        let mut user = self
            .db
            .storage
            .get_user(user_id)
            .await?
            .ok_or_else(|| HospitalError::not_found("user", user_id))?;

        if let Some(role) = update.role {
            if role != user.role && user_id == ctx.user_id {
                return Err(HospitalError::InvalidInput(
                    "you cannot change your own role".to_string(),
                ));
            }
            user.role = role;
        }
        if let Some(email) = update.email {
            validate_email(&email)?;
            user.email = email;
        }
        if let Some(first_name) = update.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            user.last_name = last_name;
        }
        if let Some(is_active) = update.is_active {
            user.is_active = is_active;
        }
        if let Some(ref password) = update.password {
            validate_password(password)?;
            user.set_password(password)?;
        }

        self.db.storage.update_user(user.clone()).await?;
        Ok(user)
    }

    pub async fn delete_user(&self, ctx: &AuthContext, user_id: i32) -> HospitalResult<()> {
        ctx.require(Capability::ManageUsers)?;
        if user_id == ctx.user_id {
            return Err(HospitalError::InvalidInput(
                "you cannot delete your own account".to_string(),
            ));
        }
        self.db.storage.delete_user(user_id).await
    }

    pub async fn list_users(&self, ctx: &AuthContext) -> HospitalResult<Vec<User>> {
        ctx.require(Capability::ManageUsers)?;
        self.db.storage.list_users().await
    }

    /// Seeds the first admin account on an empty store; no-op otherwise.
    pub async fn bootstrap_admin(
        &self,
        email: &str,
        password: &str,
    ) -> HospitalResult<Option<User>> {
        if !self.db.storage.list_users().await?.is_empty() {
            return Ok(None);
        }
        let mut admin = User {
            id: 0,
            email: email.to_string(),
            password_hash: String::new(),
            first_name: "System".to_string(),
            last_name: "Administrator".to_string(),
            role: Role::Admin,
            is_active: true,
            created_at: Utc::now(),
        };
        admin.set_password(password)?;
        let admin = self.db.storage.insert_user(admin).await?;
        warn!("seeded initial admin account {}", admin.email);
        Ok(Some(admin))
    }
}

fn validate_email(email: &str) -> HospitalResult<()> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(ValidationError::InvalidEmail(email.to_string()).into());
    }
    Ok(())
}

fn validate_password(password: &str) -> HospitalResult<()> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort(MIN_PASSWORD_LENGTH).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{ctx, new_user};

    fn service() -> AccountService {
        AccountService::new(Database::in_memory())
    }

    #[tokio::test]
    async fn should_authenticate_a_registered_user() {
        let accounts = service();
        let admin = accounts
            .bootstrap_admin("admin@example.org", "wardround8")
            .await
            .unwrap()
            .unwrap();
        let auth = accounts
            .authenticate("admin@example.org", "wardround8")
            .await
            .unwrap();
        assert_eq!(auth.user_id, admin.id);
        assert_eq!(auth.role, Role::Admin);
    }

    #[tokio::test]
    async fn should_reject_bad_credentials_uniformly() {
        let accounts = service();
        accounts
            .bootstrap_admin("admin@example.org", "wardround8")
            .await
            .unwrap();
        let unknown = accounts.authenticate("ghost@example.org", "wardround8").await;
        let wrong = accounts.authenticate("admin@example.org", "wrong-pass").await;
        assert_eq!(
            unknown.unwrap_err(),
            HospitalError::Auth("invalid email or password".to_string())
        );
        assert_eq!(
            wrong.unwrap_err(),
            HospitalError::Auth("invalid email or password".to_string())
        );
    }

    #[tokio::test]
    async fn should_reject_deactivated_accounts_at_login() {
        let accounts = service();
        let admin = accounts
            .bootstrap_admin("admin@example.org", "wardround8")
            .await
            .unwrap()
            .unwrap();
        let doctor = accounts
            .register_user(
                &ctx(admin.id, Role::Admin),
                NewUser {
                    email: "doc@example.org".to_string(),
                    password: "stethoscope".to_string(),
                    first_name: "Mark".to_string(),
                    last_name: "Greene".to_string(),
                    role: Role::Doctor,
                },
            )
            .await
            .unwrap();
        accounts
            .update_user(
                &ctx(admin.id, Role::Admin),
                doctor.id,
                UserUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let err = accounts
            .authenticate("doc@example.org", "stethoscope")
            .await
            .unwrap_err();
        assert!(matches!(err, HospitalError::Auth(_)));
    }

    #[tokio::test]
    async fn should_deny_registration_to_non_admins() {
        let accounts = service();
        let err = accounts
            .register_user(
                &ctx(3, Role::Receptionist),
                NewUser {
                    email: "x@example.org".to_string(),
                    password: "longenough".to_string(),
                    first_name: "A".to_string(),
                    last_name: "B".to_string(),
                    role: Role::Doctor,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HospitalError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn should_refuse_changing_your_own_role() {
        let accounts = service();
        let admin = accounts.db.storage.insert_user(new_user("admin@example.org", Role::Admin)).await.unwrap();
        let err = accounts
            .update_user(
                &ctx(admin.id, Role::Admin),
                admin.id,
                UserUpdate {
                    role: Some(Role::Doctor),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HospitalError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn should_allow_admin_to_change_another_users_role() {
        let accounts = service();
        let admin = accounts.db.storage.insert_user(new_user("admin@example.org", Role::Admin)).await.unwrap();
        let other = accounts.db.storage.insert_user(new_user("other@example.org", Role::Receptionist)).await.unwrap();
        let updated = accounts
            .update_user(
                &ctx(admin.id, Role::Admin),
                other.id,
                UserUpdate {
                    role: Some(Role::Pharmacist),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.role, Role::Pharmacist);
    }

    #[tokio::test]
    async fn should_refuse_deleting_your_own_account() {
        let accounts = service();
        let admin = accounts.db.storage.insert_user(new_user("admin@example.org", Role::Admin)).await.unwrap();
        let err = accounts
            .delete_user(&ctx(admin.id, Role::Admin), admin.id)
            .await
            .unwrap_err();
        assert!(matches!(err, HospitalError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn should_reject_short_passwords() {
        let accounts = service();
        let admin = accounts.db.storage.insert_user(new_user("admin@example.org", Role::Admin)).await.unwrap();
        let err = accounts
            .register_user(
                &ctx(admin.id, Role::Admin),
                NewUser {
                    email: "short@example.org".to_string(),
                    password: "short".to_string(),
                    first_name: "A".to_string(),
                    last_name: "B".to_string(),
                    role: Role::Doctor,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HospitalError::InvalidInput(_)));
    }
}
