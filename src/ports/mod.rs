//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `QuotaStore` - Persistence of per-user quota records

mod quota_store;

pub use quota_store::{QuotaStore, StoreError};
