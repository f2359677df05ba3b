pub mod config;
pub mod import;
pub mod rules;

use std::path::Path;

use openinghours_core::{Config, ConfigError};

/// Load the config from `--config` if given, otherwise from the default location.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}
