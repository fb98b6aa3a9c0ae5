//! User tier definitions.
//!
//! The tier is supplied when a user is added and never changes afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::QuotaError;

/// Account tier.
///
/// Determines the deck ceilings. See [`super::QuotaLimits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    /// Free tier.
    /// - 10 created decks
    /// - 1 published deck
    Free,

    /// Elevated tier.
    /// - 50 created decks
    /// - 5 published decks
    Super,
}

impl UserType {
    /// Returns the wire/storage representation of this tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Free => "free",
            UserType::Super => "super",
        }
    }

    /// Returns true for the elevated tier.
    pub fn is_super(&self) -> bool {
        matches!(self, UserType::Super)
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parses the exact lowercase names only; `"Free"` or `" free"` are rejected.
impl FromStr for UserType {
    type Err = QuotaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(UserType::Free),
            "super" => Ok(UserType::Super),
            other => Err(QuotaError::invalid_user_type(other)),
        }
    }
}
