//! StoreConfig and store path resolution.

use crate::config::paths::xdg_root;
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory of the sled record store; None means the XDG data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    /// Resolve the store directory, with `cli_path` taking precedence.
    pub fn resolve_path(&self, cli_path: Option<PathBuf>) -> Result<PathBuf, ApiError> {
        if let Some(p) = cli_path {
            if !p.as_os_str().is_empty() {
                return Ok(p);
            }
        }
        if let Some(p) = &self.path {
            if !p.as_os_str().is_empty() {
                return Ok(p.clone());
            }
        }
        xdg_root::default_store_dir()
    }
}
