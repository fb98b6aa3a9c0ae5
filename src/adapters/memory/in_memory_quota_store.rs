//! In-memory quota store for testing and single-process deployments.
//!
//! Records live in a `HashMap` behind a tokio `RwLock`. Each trait method
//! holds the lock for its whole read-compare-write, so conditional writes are
//! atomic with respect to each other.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::UserId;
use crate::domain::quota::{DeckCounters, UserQuotaRecord};
use crate::ports::{QuotaStore, StoreError};

/// In-memory implementation of the QuotaStore port.
///
/// Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQuotaStore {
    records: Arc<RwLock<HashMap<UserId, UserQuotaRecord>>>,
}

impl InMemoryQuotaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl QuotaStore for InMemoryQuotaStore {
    async fn get(&self, user_id: &UserId) -> Result<Option<UserQuotaRecord>, StoreError> {
        Ok(self.records.read().await.get(user_id).cloned())
    }

    async fn put(&self, record: &UserQuotaRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.user_id) {
            return Err(StoreError::AlreadyExists(record.user_id.clone()));
        }
        records.insert(record.user_id.clone(), record.clone());
        Ok(())
    }

    async fn update_counters(
        &self,
        user_id: &UserId,
        expected: DeckCounters,
        next: DeckCounters,
    ) -> Result<UserQuotaRecord, StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(user_id)
            .ok_or_else(|| StoreError::NotFound(user_id.clone()))?;

        if record.counters != expected {
            return Err(StoreError::Conflict {
                current: record.counters,
            });
        }

        record.counters = next;
        Ok(record.clone())
    }

    async fn delete(&self, user_id: &UserId) -> Result<(), StoreError> {
        self.records.write().await.remove(user_id);
        Ok(())
    }
}
