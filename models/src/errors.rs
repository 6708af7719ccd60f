use std::io;
pub use thiserror::Error;
use serde::{Deserialize, Serialize};

/// The error taxonomy shared by every layer of the system.
///
/// The first six variants are expected business-rule violations and are
/// recovered at the request boundary; `Storage`, `Configuration` and
/// `Internal` are fatal faults and propagate.
#[derive(Debug, Serialize, Deserialize, Error, Clone, PartialEq)]
pub enum HospitalError {
    #[error("{0} was not found")]
    NotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("insufficient stock for {medication}: requested {requested}, available {available}")]
    InsufficientStock {
        medication: String,
        requested: i32,
        available: i32,
    },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{0} already exists")]
    AlreadyExists(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl HospitalError {
    /// Convenience constructor for the common "entity with id N" lookup miss.
    pub fn not_found(entity: &str, id: i32) -> Self {
        HospitalError::NotFound(format!("{} {}", entity, id))
    }

    /// True for the variants a request boundary translates into a
    /// user-facing message rather than a failure page.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            HospitalError::Storage(_)
                | HospitalError::Configuration(_)
                | HospitalError::Internal(_)
        )
    }
}

impl From<&str> for HospitalError {
    fn from(error: &str) -> Self {
        HospitalError::InvalidInput(error.to_string())
    }
}

impl From<io::Error> for HospitalError {
    fn from(err: io::Error) -> Self {
        HospitalError::Storage(format!("IO error: {}", err))
    }
}

impl From<bcrypt::BcryptError> for HospitalError {
    fn from(err: bcrypt::BcryptError) -> Self {
        HospitalError::Internal(format!("password hashing error: {}", err))
    }
}

impl From<ValidationError> for HospitalError {
    fn from(err: ValidationError) -> Self {
        HospitalError::InvalidInput(err.to_string())
    }
}

/// Field-level input validation failures, folded into
/// `HospitalError::InvalidInput` at the workflow boundary.
#[derive(Debug, Serialize, Deserialize, Error, PartialEq, Clone)]
pub enum ValidationError {
    #[error("field '{0}' is required")]
    Required(String),
    #[error("field '{0}' must be a positive quantity")]
    NonPositiveQuantity(String),
    #[error("field '{0}' must not be negative")]
    NegativeAmount(String),
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("'{0}' is not a valid role")]
    InvalidRole(String),
    #[error("'{0}' is not a valid status")]
    InvalidStatus(String),
    #[error("'{0}' is not a valid bill item type")]
    InvalidItemType(String),
    #[error("'{0}' is not a valid date")]
    InvalidDateFormat(String),
    #[error("password must be at least {0} characters long")]
    PasswordTooShort(usize),
}

/// A type alias for a `Result` that returns a `HospitalError` on failure.
pub type HospitalResult<T> = Result<T, HospitalError>;

/// A type alias for a `Result` that returns a `ValidationError` on failure.
pub type ValidationResult<T> = Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_format_insufficient_stock() {
        let err = HospitalError::InsufficientStock {
            medication: "Amoxicillin".to_string(),
            requested: 10,
            available: 5,
        };
        assert_eq!(
            err.to_string(),
            "insufficient stock for Amoxicillin: requested 10, available 5"
        );
    }

    #[test]
    fn should_classify_business_errors_as_recoverable() {
        assert!(HospitalError::not_found("patient", 3).is_recoverable());
        assert!(HospitalError::InvalidState("dispensed".into()).is_recoverable());
        assert!(!HospitalError::Storage("down".into()).is_recoverable());
    }

    #[test]
    fn should_fold_validation_into_invalid_input() {
        let err: HospitalError = ValidationError::NonPositiveQuantity("quantity".into()).into();
        assert!(matches!(err, HospitalError::InvalidInput(_)));
    }
}
