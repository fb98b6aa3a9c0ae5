//! Redis adapters.
//!
//! - `RedisQuotaStore` - Hash-per-user quota records with Lua conditional writes

mod redis_quota_store;

pub use redis_quota_store::RedisQuotaStore;
