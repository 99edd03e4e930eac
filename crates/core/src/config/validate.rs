use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Worker count, timeouts, input limits and channel capacity are not 0
/// - Tool paths are not empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.batch.workers == 0 {
        return Err(ConfigError::ValidationError(
            "batch.workers cannot be 0".to_string(),
        ));
    }

    if config.backends.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "backends.timeout_secs cannot be 0".to_string(),
        ));
    }

    for (tool, path) in config.backends.tools() {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "backends: path for {} cannot be empty",
                tool
            )));
        }
    }

    if config.summarizer.max_input_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "summarizer.max_input_bytes cannot be 0".to_string(),
        ));
    }

    if config.summarizer.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "summarizer.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.log.channel_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "log.channel_capacity cannot be 0".to_string(),
        ));
    }

    Ok(())
}
