//! QuotaService - Deck quota enforcement.
//!
//! Owns the tier rules and orchestrates read/decide/write sequences against
//! the [`QuotaStore`] port. The service itself holds no state between calls.
//!
//! Counter changes are written with a compare-and-set on the counters that
//! were read. When another writer got in first the store reports the fresh
//! counters and the decision is re-made against them, so concurrent callers
//! can neither lose an increment nor push a counter past its ceiling.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::foundation::UserId;
use crate::domain::quota::{
    CounterChange, CounterKind, QuotaError, QuotaLimits, UserQuotaRecord, UserType,
};
use crate::ports::{QuotaStore, StoreError};

/// Default bound on compare-and-set rounds per counter change.
pub const DEFAULT_MAX_WRITE_ATTEMPTS: u32 = 32;

/// Confirmation returned by [`QuotaService::add_user`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreated {
    pub user_id: UserId,
    pub user_type: UserType,
}

/// Confirmation returned by [`QuotaService::delete_user`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDeleted {
    pub user_id: UserId,
}

/// A record together with its tier limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaUsage {
    pub record: UserQuotaRecord,
    pub limits: QuotaLimits,
}

impl QuotaUsage {
    pub fn remaining(&self, kind: CounterKind) -> u32 {
        self.record.remaining(kind)
    }
}

/// Quota enforcement over a [`QuotaStore`].
pub struct QuotaService {
    store: Arc<dyn QuotaStore>,
    max_write_attempts: u32,
}

impl QuotaService {
    pub fn new(store: Arc<dyn QuotaStore>) -> Self {
        Self {
            store,
            max_write_attempts: DEFAULT_MAX_WRITE_ATTEMPTS,
        }
    }

    /// Override the compare-and-set bound. Values below 1 are treated as 1.
    pub fn with_max_write_attempts(mut self, attempts: u32) -> Self {
        self.max_write_attempts = attempts.max(1);
        self
    }

    pub fn max_write_attempts(&self) -> u32 {
        self.max_write_attempts
    }

    /// True if the user exists and is below the created-deck ceiling.
    pub async fn can_create_deck(&self, user_id: &UserId) -> Result<bool, QuotaError> {
        self.can_increment(user_id, CounterKind::Created).await
    }

    /// True if the user exists and is below the published-deck ceiling.
    pub async fn can_publish_deck(&self, user_id: &UserId) -> Result<bool, QuotaError> {
        self.can_increment(user_id, CounterKind::Published).await
    }

    /// Count one more created deck.
    ///
    /// # Errors
    ///
    /// - `QuotaExceeded(created)` if the user is unknown or at the ceiling
    pub async fn create_deck(&self, user_id: &UserId) -> Result<UserQuotaRecord, QuotaError> {
        self.apply_change(user_id, CounterChange::Increment(CounterKind::Created))
            .await
    }

    /// Count one more published deck.
    ///
    /// # Errors
    ///
    /// - `QuotaExceeded(published)` if the user is unknown or at the ceiling
    pub async fn publish_deck(&self, user_id: &UserId) -> Result<UserQuotaRecord, QuotaError> {
        self.apply_change(user_id, CounterChange::Increment(CounterKind::Published))
            .await
    }

    /// Count one created deck fewer.
    ///
    /// # Errors
    ///
    /// - `NothingToDelete(created)` if the user is unknown or the count is 0
    pub async fn delete_created_deck(
        &self,
        user_id: &UserId,
    ) -> Result<UserQuotaRecord, QuotaError> {
        self.apply_change(user_id, CounterChange::Decrement(CounterKind::Created))
            .await
    }

    /// Count one published deck fewer.
    ///
    /// # Errors
    ///
    /// - `NothingToDelete(published)` if the user is unknown or the count is 0
    pub async fn delete_published_deck(
        &self,
        user_id: &UserId,
    ) -> Result<UserQuotaRecord, QuotaError> {
        self.apply_change(user_id, CounterChange::Decrement(CounterKind::Published))
            .await
    }

    /// Register a user with both counters at zero.
    ///
    /// # Errors
    ///
    /// - `InvalidUserType` unless `user_type` is exactly `"free"` or `"super"`
    /// - `AlreadyExists` if the user is already on file
    pub async fn add_user(
        &self,
        user_id: &UserId,
        user_type: &str,
    ) -> Result<UserCreated, QuotaError> {
        let user_type: UserType = user_type.parse()?;

        if self.store.get(user_id).await?.is_some() {
            return Err(QuotaError::already_exists(user_id.clone()));
        }

        // The store insert is conditional as well, covering a racing add.
        self.store
            .put(&UserQuotaRecord::new(user_id.clone(), user_type))
            .await?;

        tracing::info!(user_id = %user_id, user_type = %user_type, "User added");
        Ok(UserCreated {
            user_id: user_id.clone(),
            user_type,
        })
    }

    /// Remove a user and their counters.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the user is not on file
    pub async fn delete_user(&self, user_id: &UserId) -> Result<UserDeleted, QuotaError> {
        if self.store.get(user_id).await?.is_none() {
            return Err(QuotaError::not_found(user_id.clone()));
        }

        self.store.delete(user_id).await?;

        tracing::info!(user_id = %user_id, "User deleted");
        Ok(UserDeleted {
            user_id: user_id.clone(),
        })
    }

    /// Current counters and tier limits.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the user is not on file
    pub async fn get_usage(&self, user_id: &UserId) -> Result<QuotaUsage, QuotaError> {
        let record = self
            .store
            .get(user_id)
            .await?
            .ok_or_else(|| QuotaError::not_found(user_id.clone()))?;

        Ok(QuotaUsage {
            limits: record.limits(),
            record,
        })
    }

    async fn can_increment(&self, user_id: &UserId, kind: CounterKind) -> Result<bool, QuotaError> {
        Ok(self
            .store
            .get(user_id)
            .await?
            .map(|record| record.can_increment(kind))
            .unwrap_or(false))
    }

    /// Read, decide and conditionally write one counter change.
    async fn apply_change(
        &self,
        user_id: &UserId,
        change: CounterChange,
    ) -> Result<UserQuotaRecord, QuotaError> {
        let mut record = self
            .store
            .get(user_id)
            .await?
            .ok_or_else(|| change.refusal())?;

        for attempt in 1..=self.max_write_attempts {
            let next = change.apply(&record)?;

            match self
                .store
                .update_counters(user_id, record.counters, next)
                .await
            {
                Ok(updated) => {
                    tracing::debug!(
                        user_id = %user_id,
                        counter = %change.kind(),
                        decks_created = updated.decks_created(),
                        decks_published = updated.decks_published(),
                        "Deck counter updated"
                    );
                    return Ok(updated);
                }
                Err(StoreError::Conflict { current }) => {
                    tracing::warn!(
                        user_id = %user_id,
                        counter = %change.kind(),
                        attempt,
                        "Deck counters changed concurrently, re-checking quota"
                    );
                    record = record.with_counters(current);
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::warn!(
            user_id = %user_id,
            counter = %change.kind(),
            attempts = self.max_write_attempts,
            "Gave up updating deck counters under contention"
        );
        Err(QuotaError::store_unavailable(format!(
            "counters for user {} kept changing after {} attempts",
            user_id, self.max_write_attempts
        )))
    }
}

impl std::fmt::Debug for QuotaService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaService")
            .field("max_write_attempts", &self.max_write_attempts)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryQuotaStore;
    use crate::domain::quota::DeckCounters;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    // ════════════════════════════════════════════════════════════════════════════
    // Test Stores
    // ════════════════════════════════════════════════════════════════════════════

    /// Store whose every call fails as if the backend were down.
    struct UnavailableStore;

    #[async_trait]
    impl QuotaStore for UnavailableStore {
        async fn get(&self, _user_id: &UserId) -> Result<Option<UserQuotaRecord>, StoreError> {
            Err(StoreError::unavailable("connection refused"))
        }

        async fn put(&self, _record: &UserQuotaRecord) -> Result<(), StoreError> {
            Err(StoreError::unavailable("connection refused"))
        }

        async fn update_counters(
            &self,
            _user_id: &UserId,
            _expected: DeckCounters,
            _next: DeckCounters,
        ) -> Result<UserQuotaRecord, StoreError> {
            Err(StoreError::unavailable("connection refused"))
        }

        async fn delete(&self, _user_id: &UserId) -> Result<(), StoreError> {
            Err(StoreError::unavailable("connection refused"))
        }
    }

    /// Wraps the in-memory store and sneaks in a competing write before the
    /// first `interleave` conditional updates.
    struct InterleavingStore {
        inner: InMemoryQuotaStore,
        competing: CounterChange,
        interleave: AtomicU32,
    }

    impl InterleavingStore {
        fn new(inner: InMemoryQuotaStore, competing: CounterChange, interleave: u32) -> Self {
            Self {
                inner,
                competing,
                interleave: AtomicU32::new(interleave),
            }
        }
    }

    #[async_trait]
    impl QuotaStore for InterleavingStore {
        async fn get(&self, user_id: &UserId) -> Result<Option<UserQuotaRecord>, StoreError> {
            self.inner.get(user_id).await
        }

        async fn put(&self, record: &UserQuotaRecord) -> Result<(), StoreError> {
            self.inner.put(record).await
        }

        async fn update_counters(
            &self,
            user_id: &UserId,
            expected: DeckCounters,
            next: DeckCounters,
        ) -> Result<UserQuotaRecord, StoreError> {
            let remaining = self.interleave.load(Ordering::SeqCst);
            if remaining > 0 {
                self.interleave.store(remaining - 1, Ordering::SeqCst);
                if let Some(current) = self.inner.get(user_id).await? {
                    if let Ok(competing) = self.competing.apply(&current) {
                        self.inner
                            .update_counters(user_id, current.counters, competing)
                            .await?;
                    }
                }
            }
            self.inner.update_counters(user_id, expected, next).await
        }

        async fn delete(&self, user_id: &UserId) -> Result<(), StoreError> {
            self.inner.delete(user_id).await
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn service() -> QuotaService {
        QuotaService::new(Arc::new(InMemoryQuotaStore::new()))
    }

    async fn service_with_user(id: &str, user_type: &str) -> QuotaService {
        let service = service();
        service.add_user(&user(id), user_type).await.unwrap();
        service
    }

    // ════════════════════════════════════════════════════════════════════════════
    // can_create_deck / can_publish_deck
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn unknown_user_cannot_create_or_publish() {
        let service = service();
        assert!(!service.can_create_deck(&user("ghost")).await.unwrap());
        assert!(!service.can_publish_deck(&user("ghost")).await.unwrap());
    }

    #[tokio::test]
    async fn fresh_user_can_create_and_publish() {
        let service = service_with_user("u1", "free").await;
        assert!(service.can_create_deck(&user("u1")).await.unwrap());
        assert!(service.can_publish_deck(&user("u1")).await.unwrap());
    }

    #[tokio::test]
    async fn free_user_cannot_publish_after_one() {
        let service = service_with_user("u1", "free").await;
        service.publish_deck(&user("u1")).await.unwrap();
        assert!(!service.can_publish_deck(&user("u1")).await.unwrap());
        assert!(service.can_create_deck(&user("u1")).await.unwrap());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // create_deck / publish_deck
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn create_deck_increments_only_created() {
        let service = service_with_user("u1", "super").await;
        service.publish_deck(&user("u1")).await.unwrap();

        let record = service.create_deck(&user("u1")).await.unwrap();
        assert_eq!(record.counters, DeckCounters::new(1, 1));
        assert_eq!(record.user_type, UserType::Super);
    }

    #[tokio::test]
    async fn free_user_hits_created_ceiling_at_ten() {
        let service = service_with_user("u1", "free").await;
        for n in 1..=10 {
            let record = service.create_deck(&user("u1")).await.unwrap();
            assert_eq!(record.decks_created(), n);
        }

        let err = service.create_deck(&user("u1")).await.unwrap_err();
        assert_eq!(err, QuotaError::QuotaExceeded(CounterKind::Created));

        let usage = service.get_usage(&user("u1")).await.unwrap();
        assert_eq!(usage.record.decks_created(), 10);
    }

    #[tokio::test]
    async fn super_user_hits_published_ceiling_at_five() {
        let service = service_with_user("u1", "super").await;
        for _ in 0..5 {
            service.publish_deck(&user("u1")).await.unwrap();
        }

        let err = service.publish_deck(&user("u1")).await.unwrap_err();
        assert_eq!(err, QuotaError::QuotaExceeded(CounterKind::Published));
    }

    #[tokio::test]
    async fn create_deck_for_unknown_user_is_quota_exceeded() {
        let service = service();
        let err = service.create_deck(&user("ghost")).await.unwrap_err();
        assert_eq!(err, QuotaError::QuotaExceeded(CounterKind::Created));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // delete_created_deck / delete_published_deck
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn delete_created_deck_restores_prior_value() {
        let service = service_with_user("u1", "free").await;
        service.create_deck(&user("u1")).await.unwrap();
        service.create_deck(&user("u1")).await.unwrap();

        let record = service.delete_created_deck(&user("u1")).await.unwrap();
        assert_eq!(record.decks_created(), 1);
    }

    #[tokio::test]
    async fn delete_created_deck_at_zero_is_nothing_to_delete() {
        let service = service_with_user("u1", "free").await;
        let err = service.delete_created_deck(&user("u1")).await.unwrap_err();
        assert_eq!(err, QuotaError::NothingToDelete(CounterKind::Created));
    }

    #[tokio::test]
    async fn delete_published_deck_keeps_created() {
        let service = service_with_user("u1", "super").await;
        service.create_deck(&user("u1")).await.unwrap();
        service.publish_deck(&user("u1")).await.unwrap();

        let record = service.delete_published_deck(&user("u1")).await.unwrap();
        assert_eq!(record.counters, DeckCounters::new(1, 0));

        let err = service.delete_published_deck(&user("u1")).await.unwrap_err();
        assert_eq!(err, QuotaError::NothingToDelete(CounterKind::Published));
    }

    #[tokio::test]
    async fn delete_deck_for_unknown_user_is_nothing_to_delete() {
        let service = service();
        let err = service.delete_published_deck(&user("ghost")).await.unwrap_err();
        assert_eq!(err, QuotaError::NothingToDelete(CounterKind::Published));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // add_user / delete_user / get_usage
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn add_user_returns_confirmation() {
        let service = service();
        let created = service.add_user(&user("u1"), "super").await.unwrap();
        assert_eq!(created.user_id, user("u1"));
        assert_eq!(created.user_type, UserType::Super);

        let usage = service.get_usage(&user("u1")).await.unwrap();
        assert_eq!(usage.record.counters, DeckCounters::zero());
        assert_eq!(usage.limits, QuotaLimits::for_user_type(UserType::Super));
    }

    #[tokio::test]
    async fn add_user_rejects_invalid_type_before_touching_store() {
        let service = QuotaService::new(Arc::new(UnavailableStore));
        let err = service.add_user(&user("u1"), "premium").await.unwrap_err();
        assert_eq!(err, QuotaError::InvalidUserType("premium".to_string()));
    }

    #[tokio::test]
    async fn add_user_twice_is_already_exists_and_keeps_state() {
        let service = service_with_user("u1", "free").await;
        service.create_deck(&user("u1")).await.unwrap();

        let err = service.add_user(&user("u1"), "super").await.unwrap_err();
        assert_eq!(err, QuotaError::AlreadyExists(user("u1")));

        let usage = service.get_usage(&user("u1")).await.unwrap();
        assert_eq!(usage.record.user_type, UserType::Free);
        assert_eq!(usage.record.decks_created(), 1);
    }

    #[tokio::test]
    async fn delete_user_unknown_is_not_found() {
        let service = service();
        let err = service.delete_user(&user("ghost")).await.unwrap_err();
        assert_eq!(err, QuotaError::NotFound(user("ghost")));
    }

    #[tokio::test]
    async fn delete_user_then_re_add_starts_fresh() {
        let service = service_with_user("u1", "free").await;
        service.create_deck(&user("u1")).await.unwrap();

        let deleted = service.delete_user(&user("u1")).await.unwrap();
        assert_eq!(deleted.user_id, user("u1"));
        assert!(!service.can_create_deck(&user("u1")).await.unwrap());

        service.add_user(&user("u1"), "free").await.unwrap();
        let usage = service.get_usage(&user("u1")).await.unwrap();
        assert_eq!(usage.record.counters, DeckCounters::zero());
    }

    #[tokio::test]
    async fn get_usage_reports_remaining() {
        let service = service_with_user("u1", "free").await;
        service.create_deck(&user("u1")).await.unwrap();

        let usage = service.get_usage(&user("u1")).await.unwrap();
        assert_eq!(usage.remaining(CounterKind::Created), 9);
        assert_eq!(usage.remaining(CounterKind::Published), 1);
    }

    #[tokio::test]
    async fn get_usage_unknown_is_not_found() {
        let service = service();
        assert_eq!(
            service.get_usage(&user("ghost")).await.unwrap_err(),
            QuotaError::NotFound(user("ghost"))
        );
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Store failures and contention
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn store_failures_propagate_as_store_unavailable() {
        let service = QuotaService::new(Arc::new(UnavailableStore));
        let id = user("u1");

        for err in [
            service.can_create_deck(&id).await.unwrap_err(),
            service.create_deck(&id).await.unwrap_err(),
            service.delete_published_deck(&id).await.unwrap_err(),
            service.add_user(&id, "free").await.unwrap_err(),
            service.delete_user(&id).await.unwrap_err(),
        ] {
            assert!(matches!(err, QuotaError::StoreUnavailable(_)), "{:?}", err);
        }
    }

    #[tokio::test]
    async fn conflicting_write_is_rechecked_not_lost() {
        let inner = InMemoryQuotaStore::new();
        let store = InterleavingStore::new(
            inner.clone(),
            CounterChange::Increment(CounterKind::Created),
            1,
        );
        let service = QuotaService::new(Arc::new(store));
        service.add_user(&user("u1"), "free").await.unwrap();

        let record = service.create_deck(&user("u1")).await.unwrap();
        // Both the competing write and ours landed.
        assert_eq!(record.decks_created(), 2);
    }

    #[tokio::test]
    async fn conflicting_write_that_fills_quota_is_refused() {
        let inner = InMemoryQuotaStore::new();
        let store = InterleavingStore::new(
            inner.clone(),
            CounterChange::Increment(CounterKind::Published),
            1,
        );
        let service = QuotaService::new(Arc::new(store));
        service.add_user(&user("u1"), "free").await.unwrap();

        let err = service.publish_deck(&user("u1")).await.unwrap_err();
        assert_eq!(err, QuotaError::QuotaExceeded(CounterKind::Published));

        let stored = inner.get(&user("u1")).await.unwrap().unwrap();
        assert_eq!(stored.decks_published(), 1);
    }

    #[tokio::test]
    async fn exhausting_attempts_is_store_unavailable() {
        let inner = InMemoryQuotaStore::new();
        let store = InterleavingStore::new(
            inner.clone(),
            CounterChange::Increment(CounterKind::Created),
            u32::MAX,
        );
        let service = QuotaService::new(Arc::new(store)).with_max_write_attempts(3);
        service.add_user(&user("u1"), "super").await.unwrap();

        let err = service.create_deck(&user("u1")).await.unwrap_err();
        assert!(matches!(err, QuotaError::StoreUnavailable(_)));

        // Only the competing writes landed.
        let stored = inner.get(&user("u1")).await.unwrap().unwrap();
        assert_eq!(stored.decks_created(), 3);
    }

    #[test]
    fn max_write_attempts_is_at_least_one() {
        let service = service().with_max_write_attempts(0);
        assert_eq!(service.max_write_attempts(), 1);
        assert_eq!(
            QuotaService::new(Arc::new(InMemoryQuotaStore::new())).max_write_attempts(),
            DEFAULT_MAX_WRITE_ATTEMPTS
        );
    }
}
