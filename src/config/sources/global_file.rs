//! Global config file source: `$XDG_CONFIG_HOME/nestedset/config.toml`, optional.

use crate::config::paths::xdg_root;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let path = match xdg_root::global_config_file() {
        Some(path) => path,
        None => return Ok(builder),
    };
    Ok(builder.add_source(File::from(path).required(false)))
}
