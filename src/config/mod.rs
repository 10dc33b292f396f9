//! Configuration parsing and types.

pub mod env;
pub mod parser;
pub mod types;
pub mod validate;

pub use parser::{load_config, load_config_str};
pub use types::*;
pub use validate::validate_config;

use crate::common::error::ConfigError;

/// Load a config file, apply environment overrides, then validate it.
pub fn load_and_validate(path: &str) -> Result<Config, ConfigError> {
    let empty = env::check_empty_env_vars();
    if !empty.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: empty.join(", "),
            message: "environment variable is set but empty".to_string(),
        });
    }

    let config = env::apply_env_overrides(load_config(path)?);
    validate_config(&config)?;
    Ok(config)
}
