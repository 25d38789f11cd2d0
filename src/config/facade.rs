//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::NestedSetConfig;
use config::ConfigError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the global file and environment.
    pub fn load() -> Result<NestedSetConfig, ConfigError> {
        MergeService::load(None)
    }

    /// Load configuration from a specific file, with the global file below it
    /// and the environment above it.
    pub fn load_from_file(path: &Path) -> Result<NestedSetConfig, ConfigError> {
        MergeService::load(Some(path))
    }

    /// Create default configuration.
    pub fn default() -> NestedSetConfig {
        NestedSetConfig::default()
    }
}
