//! Configuration
//!
//! Layered configuration built with the `config` crate. Precedence, lowest to
//! highest: built-in defaults, global file
//! (`$XDG_CONFIG_HOME/nestedset/config.toml`), explicit file, environment
//! (`NESTEDSET__` prefix, `__` between nested keys).

mod facade;
mod merge;
pub mod paths;
mod sources;
mod storage;

pub use facade::ConfigLoader;
pub use storage::StoreConfig;

use crate::logging::LoggingConfig;
use crate::types::NodeId;
use serde::{Deserialize, Serialize};

fn default_separator() -> String {
    ".".to_string()
}

/// Options recognized by the tree builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Root used by traversal operations when none is supplied.
    #[serde(default)]
    pub root: Option<NodeId>,

    /// String joining path segments in subtree views.
    #[serde(default = "default_separator")]
    pub separator: String,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            root: None,
            separator: default_separator(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NestedSetConfig {
    #[serde(default)]
    pub tree: TreeConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}
