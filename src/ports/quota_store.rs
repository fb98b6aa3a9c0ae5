//! Quota store port.
//!
//! Defines the contract for persisting per-user quota records in a
//! key-value backend. One record per user, keyed by user id.
//!
//! # Design
//!
//! - **Absent is not an error**: `get` returns `None` for unknown users
//! - **Conditional insert**: `put` never overwrites an existing record
//! - **Conditional counter write**: `update_counters` only applies if the
//!   stored counters still equal the ones the caller decided on
//! - **Absolute values**: counters are written whole, so replaying a write
//!   that already landed leaves the record unchanged
//!
//! # Example
//!
//! ```ignore
//! async fn bump_created(store: &dyn QuotaStore, user_id: &UserId) -> Result<(), StoreError> {
//!     if let Some(record) = store.get(user_id).await? {
//!         let next = DeckCounters::new(record.decks_created() + 1, record.decks_published());
//!         store.update_counters(user_id, record.counters, next).await?;
//!     }
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;

use crate::domain::foundation::UserId;
use crate::domain::quota::{DeckCounters, QuotaError, UserQuotaRecord};

/// Port for quota record persistence.
///
/// Implementations must be safe for concurrent use; the backend is the only
/// serialization point between concurrent callers.
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Load the record for a user.
    ///
    /// Returns `None` if the user has no record.
    async fn get(&self, user_id: &UserId) -> Result<Option<UserQuotaRecord>, StoreError>;

    /// Insert a new record.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if a record for the user is already present
    async fn put(&self, record: &UserQuotaRecord) -> Result<(), StoreError>;

    /// Overwrite both counters with `next` if they currently equal `expected`.
    ///
    /// Returns the record as stored after the write.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the user has no record
    /// - `Conflict` if the stored counters differ from `expected`
    async fn update_counters(
        &self,
        user_id: &UserId,
        expected: DeckCounters,
        next: DeckCounters,
    ) -> Result<UserQuotaRecord, StoreError>;

    /// Remove the record. Deleting an absent user is not an error.
    async fn delete(&self, user_id: &UserId) -> Result<(), StoreError>;
}

/// Errors that can occur during store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No record for the user.
    #[error("no quota record for user {0}")]
    NotFound(UserId),

    /// A record for the user is already present.
    #[error("quota record for user {0} already exists")]
    AlreadyExists(UserId),

    /// The stored counters changed since they were read.
    #[error("counters changed concurrently (now created={}, published={})", current.decks_created, current.decks_published)]
    Conflict { current: DeckCounters },

    /// A stored record could not be decoded.
    #[error("corrupt quota record: {0}")]
    Corrupt(String),

    /// Backend is unreachable or returned an error.
    #[error("quota store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn unavailable(reason: impl ToString) -> Self {
        StoreError::Unavailable(reason.to_string())
    }

    pub fn corrupt(reason: impl Into<String>) -> Self {
        StoreError::Corrupt(reason.into())
    }
}

impl From<StoreError> for QuotaError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(user_id) => QuotaError::not_found(user_id),
            StoreError::AlreadyExists(user_id) => QuotaError::already_exists(user_id),
            other => QuotaError::store_unavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn QuotaStore) {}
    }

    #[test]
    fn not_found_maps_to_domain_not_found() {
        let user_id = UserId::new("u1").unwrap();
        let err: QuotaError = StoreError::NotFound(user_id.clone()).into();
        assert_eq!(err, QuotaError::NotFound(user_id));
    }

    #[test]
    fn already_exists_maps_to_domain_already_exists() {
        let user_id = UserId::new("u1").unwrap();
        let err: QuotaError = StoreError::AlreadyExists(user_id.clone()).into();
        assert_eq!(err, QuotaError::AlreadyExists(user_id));
    }

    #[test]
    fn backend_failures_map_to_store_unavailable() {
        let err: QuotaError = StoreError::unavailable("connection refused").into();
        assert!(matches!(err, QuotaError::StoreUnavailable(ref m) if m.contains("connection refused")));

        let err: QuotaError = StoreError::corrupt("decksCreated=abc").into();
        assert!(err.is_retryable());
    }

    #[test]
    fn conflict_message_reports_current_counters() {
        let err = StoreError::Conflict {
            current: DeckCounters::new(3, 1),
        };
        assert_eq!(
            err.to_string(),
            "counters changed concurrently (now created=3, published=1)"
        );
    }
}
