//! Quota store selection

use serde::Deserialize;

use super::error::ValidationError;
use crate::application::DEFAULT_MAX_WRITE_ATTEMPTS;

/// Which QuotaStore adapter backs the service.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local map; state is lost on restart
    #[default]
    Memory,
    Redis,
    Postgres,
}

/// Store settings
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Compare-and-set rounds per counter change before giving up
    #[serde(default = "default_max_write_attempts")]
    pub max_write_attempts: u32,
}

impl StoreConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_write_attempts == 0 || self.max_write_attempts > 1000 {
            return Err(ValidationError::InvalidWriteAttempts);
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            max_write_attempts: default_max_write_attempts(),
        }
    }
}

fn default_max_write_attempts() -> u32 {
    DEFAULT_MAX_WRITE_ATTEMPTS
}
