use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::{Path, PathBuf};

use super::{types::Config, ConfigError};

const ENV_PREFIX: &str = "SWISSKNIFE_";

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "SWISSKNIFE_CONFIG";

fn base() -> Figment {
    Figment::from(Serialized::defaults(Config::default()))
}

fn extract(figment: Figment) -> Result<Config, ConfigError> {
    figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }
    extract(base().merge(Toml::file(path)))
}

/// Default config file location, if one exists.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("swissknife").join("config.toml"))
        .filter(|path| path.exists())
}

/// The config file to use: the explicit path, then `SWISSKNIFE_CONFIG`, then
/// the default location when it exists.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
        .or_else(default_config_path)
}

/// Load from the resolved config file, or from defaults and environment
/// alone when there is none.
pub fn load_effective_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    match resolve_config_path(explicit) {
        Some(path) => load_config(&path),
        None => extract(base()),
    }
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BatchMode;
    use crate::config::LlmProvider;
    use crate::oplog::LogStoreKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[batch]
mode = "parallel"
workers = 8

[backends]
ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"
timeout_secs = 60

[summarizer]
provider = "ollama"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.batch.mode, BatchMode::Parallel);
        assert_eq!(config.batch.workers, 8);
        assert_eq!(
            config.backends.ffmpeg_path,
            PathBuf::from("/opt/ffmpeg/bin/ffmpeg")
        );
        assert_eq!(config.backends.timeout_secs, 60);
        assert_eq!(config.backends.pandoc_path, PathBuf::from("pandoc"));
        assert_eq!(config.summarizer.provider, LlmProvider::Ollama);
    }

    #[test]
    fn test_load_config_from_str_empty_is_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.batch.workers, 4);
        assert_eq!(config.log.store, LogStoreKind::Jsonl);
    }

    #[test]
    fn test_load_config_from_str_bad_value() {
        let result = load_config_from_str("[batch]\nmode = \"sideways\"\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[log]
store = "sqlite"
path = "/tmp/ops.db"

[defaults]
preserve_originals = true
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.log.store, LogStoreKind::Sqlite);
        assert_eq!(config.log.path, Some(PathBuf::from("/tmp/ops.db")));
        assert!(config.defaults.preserve_originals);
        assert_eq!(config.staging.stale_after_hours, 24);
    }

    #[test]
    fn test_explicit_path_wins() {
        let path = Path::new("/etc/swissknife.toml");
        assert_eq!(resolve_config_path(Some(path)), Some(path.to_path_buf()));
    }
}
