//! Application layer - Quota use cases.
//!
//! Orchestrates the quota domain rules against the `QuotaStore` port.

mod quota_service;

pub use quota_service::{
    QuotaService, QuotaUsage, UserCreated, UserDeleted, DEFAULT_MAX_WRITE_ATTEMPTS,
};
