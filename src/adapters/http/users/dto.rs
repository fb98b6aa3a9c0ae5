//! HTTP DTOs for quota endpoints.
//!
//! JSON shapes use camelCase field names.

use serde::{Deserialize, Serialize};

use crate::application::{QuotaUsage, UserCreated, UserDeleted};
use crate::domain::foundation::UserId;
use crate::domain::quota::{CounterKind, QuotaLimits, UserQuotaRecord, UserType};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to register a user.
///
/// `user_type` stays a raw string so an unknown tier reaches the service and
/// is reported as `INVALID_USER_TYPE`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddUserRequest {
    pub user_id: String,
    pub user_type: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// A user's counters after an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaRecordResponse {
    pub user_id: UserId,
    pub user_type: UserType,
    pub decks_created: u32,
    pub decks_published: u32,
}

impl From<UserQuotaRecord> for QuotaRecordResponse {
    fn from(record: UserQuotaRecord) -> Self {
        Self {
            decks_created: record.decks_created(),
            decks_published: record.decks_published(),
            user_id: record.user_id,
            user_type: record.user_type,
        }
    }
}

/// Headroom left per counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemainingResponse {
    pub created: u32,
    pub published: u32,
}

/// Counters together with tier limits and headroom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaUsageResponse {
    pub user_id: UserId,
    pub user_type: UserType,
    pub decks_created: u32,
    pub decks_published: u32,
    pub limits: QuotaLimits,
    pub remaining: RemainingResponse,
}

impl From<QuotaUsage> for QuotaUsageResponse {
    fn from(usage: QuotaUsage) -> Self {
        let remaining = RemainingResponse {
            created: usage.remaining(CounterKind::Created),
            published: usage.remaining(CounterKind::Published),
        };
        Self {
            decks_created: usage.record.decks_created(),
            decks_published: usage.record.decks_published(),
            user_id: usage.record.user_id,
            user_type: usage.record.user_type,
            limits: usage.limits,
            remaining,
        }
    }
}

/// Answer to a can-create / can-publish check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedResponse {
    pub allowed: bool,
}

/// Confirmation for a newly registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreatedResponse {
    pub message: String,
    pub user_id: UserId,
    pub user_type: UserType,
}

impl From<UserCreated> for UserCreatedResponse {
    fn from(created: UserCreated) -> Self {
        Self {
            message: "User created successfully".to_string(),
            user_id: created.user_id,
            user_type: created.user_type,
        }
    }
}

/// Confirmation for a removed user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDeletedResponse {
    pub message: String,
    pub user_id: UserId,
}

impl From<UserDeleted> for UserDeletedResponse {
    fn from(deleted: UserDeleted) -> Self {
        Self {
            message: "User deleted successfully".to_string(),
            user_id: deleted.user_id,
        }
    }
}

/// Liveness probe body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Standard error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::quota::DeckCounters;

    fn record() -> UserQuotaRecord {
        UserQuotaRecord::from_parts(
            UserId::new("u1").unwrap(),
            UserType::Free,
            DeckCounters::new(3, 1),
        )
    }

    #[test]
    fn add_user_request_reads_camel_case() {
        let request: AddUserRequest =
            serde_json::from_str(r#"{"userId": "u1", "userType": "super"}"#).unwrap();
        assert_eq!(request.user_id, "u1");
        assert_eq!(request.user_type, "super");
    }

    #[test]
    fn record_response_serializes_camel_case() {
        let json = serde_json::to_value(QuotaRecordResponse::from(record())).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "userId": "u1",
                "userType": "free",
                "decksCreated": 3,
                "decksPublished": 1
            })
        );
    }

    #[test]
    fn usage_response_includes_limits_and_remaining() {
        let usage = QuotaUsage {
            limits: QuotaLimits::for_user_type(UserType::Free),
            record: record(),
        };
        let json = serde_json::to_value(QuotaUsageResponse::from(usage)).unwrap();
        assert_eq!(json["limits"]["maxCreated"], 10);
        assert_eq!(json["limits"]["maxPublished"], 1);
        assert_eq!(json["remaining"]["created"], 7);
        assert_eq!(json["remaining"]["published"], 0);
    }

    #[test]
    fn user_created_response_carries_message() {
        let response = UserCreatedResponse::from(UserCreated {
            user_id: UserId::new("u1").unwrap(),
            user_type: UserType::Super,
        });
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json["message"], "User created successfully");
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["userType"], "super");
    }

    #[test]
    fn error_response_serializes_camel_case() {
        let json = serde_json::to_string(&ErrorResponse::new("USER_NOT_FOUND", "gone")).unwrap();
        assert_eq!(json, r#"{"errorCode":"USER_NOT_FOUND","message":"gone"}"#);
    }
}
