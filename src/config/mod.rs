//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `DECK_QUOTA` prefix and
//! nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use deck_quota::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod redis;
mod server;
mod store;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use redis::RedisConfig;
pub use server::{Environment, ServerConfig};
pub use store::{StoreBackend, StoreConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Store backend selection
    #[serde(default)]
    pub store: StoreConfig,

    /// Required when `store.backend = redis`
    pub redis: Option<RedisConfig>,

    /// Required when `store.backend = postgres`
    pub database: Option<DatabaseConfig>,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// - `DECK_QUOTA__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `DECK_QUOTA__STORE__BACKEND=redis` -> `store.backend = redis`
    /// - `DECK_QUOTA__REDIS__URL=...` -> `redis.url = ...`
    ///
    /// A `.env` file is read first if present.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("DECK_QUOTA")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values, including that the selected
    /// backend has its section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.store.validate()?;

        match self.store.backend {
            StoreBackend::Memory => {}
            StoreBackend::Redis => self
                .redis
                .as_ref()
                .ok_or(ValidationError::MissingRequired("REDIS__URL"))?
                .validate()?,
            StoreBackend::Postgres => self
                .database
                .as_ref()
                .ok_or(ValidationError::MissingRequired("DATABASE__URL"))?
                .validate()?,
        }
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
