//! Per-user quota record.
//!
//! The single persisted entity: one record per user, holding the tier and
//! the two deck counters. Transitions are computed here as pure functions so
//! the service only has to load, decide and write.

use serde::{Deserialize, Serialize};

use super::{CounterKind, QuotaError, QuotaLimits, UserType};
use crate::domain::foundation::UserId;

/// The two deck counters, always written together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckCounters {
    pub decks_created: u32,
    pub decks_published: u32,
}

impl DeckCounters {
    pub const fn new(decks_created: u32, decks_published: u32) -> Self {
        Self {
            decks_created,
            decks_published,
        }
    }

    /// Initial state of a freshly added user.
    pub const fn zero() -> Self {
        Self::new(0, 0)
    }

    pub fn get(&self, kind: CounterKind) -> u32 {
        match kind {
            CounterKind::Created => self.decks_created,
            CounterKind::Published => self.decks_published,
        }
    }

    /// Returns a copy with `kind` replaced by `value`.
    pub fn with(&self, kind: CounterKind, value: u32) -> Self {
        match kind {
            CounterKind::Created => Self::new(value, self.decks_published),
            CounterKind::Published => Self::new(self.decks_created, value),
        }
    }
}

/// A single-step change to one counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterChange {
    Increment(CounterKind),
    Decrement(CounterKind),
}

impl CounterChange {
    pub fn kind(&self) -> CounterKind {
        match self {
            CounterChange::Increment(kind) | CounterChange::Decrement(kind) => *kind,
        }
    }

    /// Error reported when the change is not permitted, including when the
    /// user has no record.
    pub fn refusal(&self) -> QuotaError {
        match self {
            CounterChange::Increment(kind) => QuotaError::quota_exceeded(*kind),
            CounterChange::Decrement(kind) => QuotaError::nothing_to_delete(*kind),
        }
    }

    /// Computes the counters after this change, or refuses it.
    ///
    /// Increments stop at the tier ceiling; decrements stop at zero. The
    /// other counter is carried over unchanged.
    pub fn apply(&self, record: &UserQuotaRecord) -> Result<DeckCounters, QuotaError> {
        let kind = self.kind();
        let current = record.counters.get(kind);
        match self {
            CounterChange::Increment(_) => {
                if record.limits().limit_reached(kind, current) {
                    return Err(self.refusal());
                }
                Ok(record.counters.with(kind, current + 1))
            }
            CounterChange::Decrement(_) => match current.checked_sub(1) {
                Some(next) => Ok(record.counters.with(kind, next)),
                None => Err(self.refusal()),
            },
        }
    }
}

/// Quota state of one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuotaRecord {
    pub user_id: UserId,
    pub user_type: UserType,
    pub counters: DeckCounters,
}

impl UserQuotaRecord {
    /// A new record with both counters at zero.
    pub fn new(user_id: UserId, user_type: UserType) -> Self {
        Self {
            user_id,
            user_type,
            counters: DeckCounters::zero(),
        }
    }

    /// Rebuilds a record from persisted parts.
    pub fn from_parts(user_id: UserId, user_type: UserType, counters: DeckCounters) -> Self {
        Self {
            user_id,
            user_type,
            counters,
        }
    }

    pub fn limits(&self) -> QuotaLimits {
        QuotaLimits::for_user_type(self.user_type)
    }

    pub fn decks_created(&self) -> u32 {
        self.counters.decks_created
    }

    pub fn decks_published(&self) -> u32 {
        self.counters.decks_published
    }

    /// True if one more deck of `kind` fits under the ceiling.
    pub fn can_increment(&self, kind: CounterKind) -> bool {
        !self.limits().limit_reached(kind, self.counters.get(kind))
    }

    /// Remaining headroom for `kind`.
    pub fn remaining(&self, kind: CounterKind) -> u32 {
        self.limits()
            .ceiling(kind)
            .saturating_sub(self.counters.get(kind))
    }

    /// Same record carrying `counters`.
    pub fn with_counters(&self, counters: DeckCounters) -> Self {
        Self {
            counters,
            ..self.clone()
        }
    }
}
