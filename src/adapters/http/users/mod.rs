//! HTTP adapter for per-user deck quotas.
//!
//! - `POST /users` - Register a user
//! - `GET /users/:id` - Usage
//! - `DELETE /users/:id` - Remove a user
//! - `GET /users/:id/can-create-deck`, `/can-publish-deck` - Checks
//! - `POST /users/:id/create-deck`, `/publish-deck`,
//!   `/delete-created-deck`, `/delete-published-deck` - Counter changes

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{health, QuotaApiError, UsersAppState};
pub use routes::users_routes;
