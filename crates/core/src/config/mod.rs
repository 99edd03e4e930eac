//! Configuration: built-in defaults, an optional TOML file and
//! `SWISSKNIFE_`-prefixed environment variables, in that order.

mod loader;
mod types;
mod validate;

pub use loader::{
    default_config_path, load_config, load_config_from_str, load_effective_config,
    resolve_config_path, CONFIG_ENV,
};
pub use types::*;
pub use validate::validate_config;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
