//! Configuration management for the sandboxed storage manager
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `SANDBOX_VFS_*` environment overrides.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::broker::DEFAULT_REQUEST_TIMEOUT;
use crate::storage::{DELETION_BATCH_STEP, MAX_LISTING_DEPTH, StorageLimits};

/// Default location of the configuration file, without extension
pub const DEFAULT_CONFIG_PATH: &str = "config";

/// Complete storage manager configuration
#[derive(Debug, Deserialize, Clone)]
pub struct VfsConfig {
    /// Directory on disk that backs the sandboxed storage root
    pub storage_root: String,

    /// How long a caller waits for a dispatched mutation
    pub request_timeout_secs: u64,

    /// Depth step between deletion passes
    pub deletion_batch_step: usize,

    /// Recursion ceiling for listings
    pub listing_max_depth: usize,

    /// Entry ceiling for one recursive removal call, 0 means unlimited
    pub max_removal_entries: usize,
}

impl Default for VfsConfig {
    fn default() -> Self {
        Self {
            storage_root: "./storage_root".to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            deletion_batch_step: DELETION_BATCH_STEP,
            listing_max_depth: MAX_LISTING_DEPTH,
            max_removal_entries: 0,
        }
    }
}

impl VfsConfig {
    /// Load configuration from the given file (extension optional) with
    /// environment overrides. A missing file falls back to the defaults.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let defaults = VfsConfig::default();

        let settings = Config::builder()
            .set_default("storage_root", defaults.storage_root)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs as i64)?
            .set_default("deletion_batch_step", defaults.deletion_batch_step as i64)?
            .set_default("listing_max_depth", defaults.listing_max_depth as i64)?
            .set_default("max_removal_entries", defaults.max_removal_entries as i64)?
            .add_source(File::with_name(config_path).required(false))
            .add_source(Environment::with_prefix("SANDBOX_VFS"))
            .build()?;

        let config: VfsConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.storage_root.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "storage_root cannot be empty".into(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(config::ConfigError::Message(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.deletion_batch_step == 0 {
            return Err(config::ConfigError::Message(
                "deletion_batch_step must be greater than 0".into(),
            ));
        }

        if self.listing_max_depth == 0 {
            return Err(config::ConfigError::Message(
                "listing_max_depth must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Get storage root as PathBuf
    pub fn storage_root_path(&self) -> PathBuf {
        PathBuf::from(&self.storage_root)
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Limits enforced by the storage primitives
    pub fn storage_limits(&self) -> StorageLimits {
        StorageLimits {
            max_removal_entries: match self.max_removal_entries {
                0 => None,
                n => Some(n),
            },
        }
    }
}
