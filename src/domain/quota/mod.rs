//! Quota domain module.
//!
//! Per-user deck counters and the tier ceilings that bound them.
//!
//! # Module Structure
//!
//! - `user_type` - Account tier
//! - `limits` - Ceilings per tier and counter
//! - `record` - The per-user record and its counter transitions
//! - `errors` - Quota error taxonomy

mod errors;
mod limits;
mod record;
mod user_type;

pub use errors::QuotaError;
pub use limits::{CounterKind, QuotaLimits};
pub use record::{CounterChange, DeckCounters, UserQuotaRecord};
pub use user_type::UserType;
