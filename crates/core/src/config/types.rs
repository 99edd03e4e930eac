use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::backend::BackendConfig;
use crate::batch::BatchMode;
use crate::oplog::LogStoreKind;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub staging: StagingConfig,
    #[serde(default)]
    pub backends: BackendConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Where scoped working directories are created
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StagingConfig {
    #[serde(default = "default_staging_root")]
    pub root: PathBuf,
    /// Age after which `cleanup` removes a leftover staging directory.
    #[serde(default = "default_stale_after_hours")]
    pub stale_after_hours: u64,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            root: default_staging_root(),
            stale_after_hours: default_stale_after_hours(),
        }
    }
}

fn default_staging_root() -> PathBuf {
    std::env::temp_dir().join("swissknife")
}

fn default_stale_after_hours() -> u64 {
    24
}

/// Batch conversion configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    #[serde(default)]
    pub mode: BatchMode,
    /// Worker count for parallel mode.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Replace existing targets.
    #[serde(default)]
    pub overwrite: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            mode: BatchMode::default(),
            workers: default_workers(),
            overwrite: false,
        }
    }
}

fn default_workers() -> usize {
    4
}

/// Operation log configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    #[serde(default)]
    pub store: LogStoreKind,
    /// Log file. Defaults to `operations.jsonl` or `operations.db` in the
    /// user data directory, depending on `store`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Pending appends the writer task buffers.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            store: LogStoreKind::default(),
            path: None,
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl LogConfig {
    pub fn resolved_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        let file = match self.store {
            LogStoreKind::Jsonl => "operations.jsonl",
            LogStoreKind::Sqlite => "operations.db",
        };
        dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("swissknife")
            .join(file)
    }
}

fn default_channel_capacity() -> usize {
    64
}

/// Summarization provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    /// Google Gemini API.
    #[default]
    Gemini,
    /// Anthropic Claude API.
    Anthropic,
    /// Local Ollama instance.
    Ollama,
}

impl LlmProvider {
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini-2.0-flash",
            Self::Anthropic => "claude-3-5-haiku-latest",
            Self::Ollama => "llama3",
        }
    }

    /// Environment variable consulted when no key is configured.
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            Self::Gemini => Some("GOOGLE_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Ollama => None,
        }
    }
}

/// Summarizer configuration
#[derive(Clone, Deserialize, Serialize)]
pub struct SummarizerConfig {
    #[serde(default)]
    pub provider: LlmProvider,
    /// Model name. Defaults per provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Custom API base URL (for proxies or self-hosted).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_summarizer_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_input_bytes")]
    pub max_input_bytes: u64,
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
    /// File with a custom prompt template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<PathBuf>,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model: None,
            api_key: None,
            api_base: None,
            timeout_secs: default_summarizer_timeout(),
            max_input_bytes: default_max_input_bytes(),
            max_input_chars: default_max_input_chars(),
            prompt_template: None,
        }
    }
}

impl SummarizerConfig {
    pub fn model_name(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// The configured key, or the provider's environment variable.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| {
                self.provider
                    .api_key_env()
                    .and_then(|var| std::env::var(var).ok())
                    .filter(|k| !k.is_empty())
            })
    }
}

// Keep the API key out of debug output.
impl std::fmt::Debug for SummarizerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummarizerConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_input_bytes", &self.max_input_bytes)
            .field("max_input_chars", &self.max_input_chars)
            .field("prompt_template", &self.prompt_template)
            .finish()
    }
}

fn default_summarizer_timeout() -> u64 {
    120
}

fn default_max_input_bytes() -> u64 {
    100 * 1024 * 1024
}

fn default_max_input_chars() -> usize {
    400_000
}

/// Per-command defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DefaultsConfig {
    /// Keep sources after `convert` unless told otherwise.
    #[serde(default)]
    pub preserve_originals: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.batch.workers, 4);
        assert_eq!(config.batch.mode, BatchMode::Sequential);
        assert_eq!(config.log.store, LogStoreKind::Jsonl);
        assert_eq!(config.staging.stale_after_hours, 24);
        assert_eq!(config.summarizer.max_input_bytes, 100 * 1024 * 1024);
        assert!(!config.defaults.preserve_originals);
    }

    #[test]
    fn test_log_path_follows_store() {
        let mut log = LogConfig::default();
        assert!(log.resolved_path().ends_with("swissknife/operations.jsonl"));
        log.store = LogStoreKind::Sqlite;
        assert!(log.resolved_path().ends_with("swissknife/operations.db"));
        log.path = Some(PathBuf::from("/var/log/sk.jsonl"));
        assert_eq!(log.resolved_path(), PathBuf::from("/var/log/sk.jsonl"));
    }

    #[test]
    fn test_model_defaults_per_provider() {
        let mut summarizer = SummarizerConfig::default();
        assert_eq!(summarizer.model_name(), "gemini-2.0-flash");
        summarizer.provider = LlmProvider::Ollama;
        assert_eq!(summarizer.model_name(), "llama3");
        summarizer.model = Some("mistral".to_string());
        assert_eq!(summarizer.model_name(), "mistral");
    }

    #[test]
    fn test_api_key_redacted() {
        let summarizer = SummarizerConfig {
            api_key: Some("sk-secret".to_string()),
            ..SummarizerConfig::default()
        };
        assert!(!format!("{:?}", summarizer).contains("sk-secret"));
    }
}
