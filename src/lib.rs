//! Deck Quota - Per-user deck creation and publication limits
//!
//! Tracks how many decks each user has created and published and refuses
//! changes that would exceed the user's tier (free or super). Counter changes
//! are written with a compare-and-set against the store, so concurrent
//! requests never overshoot a ceiling or lose an update.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
