//! Tier-based deck ceilings.
//!
//! Maps each [`UserType`] to the maximum number of created and published
//! decks. The mapping encodes product tiers and is deliberately not
//! configurable.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::UserType;

/// Which of the two per-user counters an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterKind {
    Created,
    Published,
}

impl CounterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CounterKind::Created => "created",
            CounterKind::Published => "published",
        }
    }
}

impl fmt::Display for CounterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Deck ceilings for a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaLimits {
    /// Maximum decks a user may have created at once.
    pub max_created: u32,
    /// Maximum decks a user may have published at once.
    pub max_published: u32,
}

impl QuotaLimits {
    /// Get the limits for a specific tier.
    ///
    /// | Tier | Created | Published |
    /// |------|---------|-----------|
    /// | free | 10 | 1 |
    /// | super | 50 | 5 |
    pub const fn for_user_type(user_type: UserType) -> Self {
        match user_type {
            UserType::Free => Self {
                max_created: 10,
                max_published: 1,
            },
            UserType::Super => Self {
                max_created: 50,
                max_published: 5,
            },
        }
    }

    /// Ceiling for one counter.
    pub fn ceiling(&self, kind: CounterKind) -> u32 {
        match kind {
            CounterKind::Created => self.max_created,
            CounterKind::Published => self.max_published,
        }
    }

    /// True when `current` has reached the ceiling for `kind`.
    pub fn limit_reached(&self, kind: CounterKind, current: u32) -> bool {
        current >= self.ceiling(kind)
    }
}
