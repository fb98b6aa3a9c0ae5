//! Quota-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | QuotaExceeded | 400 |
//! | NothingToDelete | 400 |
//! | InvalidUserType | 400 |
//! | ValidationFailed | 400 |
//! | AlreadyExists | 409 |
//! | NotFound | 404 |
//! | StoreUnavailable | 503 |

use super::CounterKind;
use crate::domain::foundation::{ErrorCode, UserId, ValidationError};

/// Errors raised by quota operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaError {
    /// Create/publish attempted at or above the tier ceiling, or for an
    /// unknown user.
    QuotaExceeded(CounterKind),

    /// Decrement attempted with the counter at zero, or for an unknown user.
    NothingToDelete(CounterKind),

    /// Tier outside {free, super}.
    InvalidUserType(String),

    /// A record for this user already exists.
    AlreadyExists(UserId),

    /// No record for this user.
    NotFound(UserId),

    /// Malformed input.
    ValidationFailed { field: String, message: String },

    /// The backing store failed or could not complete the write.
    StoreUnavailable(String),
}

impl QuotaError {
    pub fn quota_exceeded(kind: CounterKind) -> Self {
        QuotaError::QuotaExceeded(kind)
    }

    pub fn nothing_to_delete(kind: CounterKind) -> Self {
        QuotaError::NothingToDelete(kind)
    }

    pub fn invalid_user_type(user_type: impl Into<String>) -> Self {
        QuotaError::InvalidUserType(user_type.into())
    }

    pub fn already_exists(user_id: UserId) -> Self {
        QuotaError::AlreadyExists(user_id)
    }

    pub fn not_found(user_id: UserId) -> Self {
        QuotaError::NotFound(user_id)
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        QuotaError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn store_unavailable(reason: impl Into<String>) -> Self {
        QuotaError::StoreUnavailable(reason.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            QuotaError::QuotaExceeded(_) => ErrorCode::QuotaExceeded,
            QuotaError::NothingToDelete(_) => ErrorCode::NothingToDelete,
            QuotaError::InvalidUserType(_) => ErrorCode::InvalidUserType,
            QuotaError::AlreadyExists(_) => ErrorCode::UserExists,
            QuotaError::NotFound(_) => ErrorCode::UserNotFound,
            QuotaError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            QuotaError::StoreUnavailable(_) => ErrorCode::StoreUnavailable,
        }
    }

    /// Returns a user-friendly error message.
    pub fn message(&self) -> String {
        match self {
            QuotaError::QuotaExceeded(kind) => format!("Limit of {} decks reached", kind),
            QuotaError::NothingToDelete(kind) => format!("No {} deck to delete", kind),
            QuotaError::InvalidUserType(user_type) => format!(
                "Invalid user type '{}': must be \"free\" or \"super\"",
                user_type
            ),
            QuotaError::AlreadyExists(user_id) => format!("User {} already exists", user_id),
            QuotaError::NotFound(user_id) => format!("User {} not found", user_id),
            QuotaError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            QuotaError::StoreUnavailable(reason) => {
                format!("Quota store unavailable: {}", reason)
            }
        }
    }

    /// Returns true if the caller may retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, QuotaError::StoreUnavailable(_))
    }
}

impl std::fmt::Display for QuotaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for QuotaError {}

impl From<ValidationError> for QuotaError {
    fn from(err: ValidationError) -> Self {
        QuotaError::ValidationFailed {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}
