//! Adapters - Implementations of port interfaces.
//!
//! - `memory` - Process-local QuotaStore
//! - `redis` - Redis-backed QuotaStore
//! - `postgres` - PostgreSQL-backed QuotaStore
//! - `http` - axum REST API over the quota service

pub mod http;
pub mod memory;
pub mod postgres;
pub mod redis;

use std::sync::Arc;

use crate::config::{AppConfig, StoreBackend, ValidationError};
use crate::ports::{QuotaStore, StoreError};

pub use memory::InMemoryQuotaStore;
pub use postgres::PostgresQuotaStore;
pub use redis::RedisQuotaStore;

/// Build the QuotaStore selected by `store.backend`.
pub async fn connect_store(config: &AppConfig) -> Result<Arc<dyn QuotaStore>, StoreError> {
    let store: Arc<dyn QuotaStore> = match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory quota store; state is lost on restart");
            Arc::new(InMemoryQuotaStore::new())
        }
        StoreBackend::Redis => {
            let redis = config.redis.as_ref().ok_or_else(|| {
                StoreError::unavailable(ValidationError::MissingRequired("REDIS__URL"))
            })?;
            Arc::new(RedisQuotaStore::connect(redis).await?)
        }
        StoreBackend::Postgres => {
            let database = config.database.as_ref().ok_or_else(|| {
                StoreError::unavailable(ValidationError::MissingRequired("DATABASE__URL"))
            })?;
            Arc::new(PostgresQuotaStore::connect(database).await?)
        }
    };

    tracing::info!(backend = ?config.store.backend, "Quota store ready");
    Ok(store)
}
