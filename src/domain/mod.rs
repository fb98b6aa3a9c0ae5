//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (identifiers, errors)
//! - `quota` - Tiers, ceilings and the per-user deck counters

pub mod foundation;
pub mod quota;
