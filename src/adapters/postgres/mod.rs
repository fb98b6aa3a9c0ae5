//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresQuotaStore` - Row-per-user quota records with conditional updates

mod postgres_quota_store;

pub use postgres_quota_store::PostgresQuotaStore;
