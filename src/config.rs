//! Accumulator tuning configuration.
//!
//! The defaults match the canonical Fortuna parameters; deployments with
//! compatibility constraints can override them from a TOML file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::accumulator::{PoolHash, MAX_EVENT_SIZE};

/// Tuning parameters for a [`Fortuna`](crate::Fortuna) instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FortunaConfig {
    /// Bytes that must accumulate in pool 0 before a reseed may trigger.
    pub min_pool_size: u64,
    /// Minimum interval between reseeds.
    ///
    /// Bounds how fast an attacker controlling one source can force pool
    /// drains.
    pub reseed_delay: Duration,
    /// Per-pool buffer cap in bytes; events that would overflow it are
    /// silently dropped whole.
    pub max_pool_bytes: usize,
    /// Digest applied to pool contents at reseed time.
    pub pool_hash: PoolHash,
    /// Interval between background seed-file refreshes.
    pub auto_update_interval: Duration,
}

impl Default for FortunaConfig {
    fn default() -> Self {
        Self {
            min_pool_size: 64,
            reseed_delay: Duration::from_millis(100),
            max_pool_bytes: 64 * 1024,
            pool_hash: PoolHash::Sha256,
            auto_update_interval: Duration::from_secs(600),
        }
    }
}

impl FortunaConfig {
    /// The Tunafish variant: Keccak-256 pool digests over the same
    /// AES-256/SHA-256 generator.
    pub fn tunafish() -> Self {
        Self {
            pool_hash: PoolHash::Keccak256,
            ..Default::default()
        }
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileRead(e.to_string()))?;
        let config: Self =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the tuning parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_pool_size == 0 {
            return Err(ConfigError::ZeroPoolThreshold);
        }
        if self.max_pool_bytes < MAX_EVENT_SIZE + 2 {
            return Err(ConfigError::PoolCapTooSmall);
        }
        if self.auto_update_interval.is_zero() {
            return Err(ConfigError::ZeroUpdateInterval);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("pool 0 reseed threshold must be nonzero")]
    ZeroPoolThreshold,
    #[error("pool byte cap cannot hold a maximum-size event")]
    PoolCapTooSmall,
    #[error("auto-update interval must be nonzero")]
    ZeroUpdateInterval,
    #[error("failed to read config file: {0}")]
    FileRead(String),
    #[error("failed to parse config file: {0}")]
    Parse(String),
}
