//! Source composition for configuration loading.

pub mod service;

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError};

/// Builder seeded with the defaults every source is merged over.
pub(crate) fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    config::Config::builder()
        .set_default("tree.separator", ".")?
        .set_default("logging.level", "info")
}
