//! In-memory adapters for tests and single-process deployments.

mod in_memory_quota_store;

pub use in_memory_quota_store::InMemoryQuotaStore;
