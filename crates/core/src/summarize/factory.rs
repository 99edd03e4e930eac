use std::sync::Arc;
use std::time::Duration;

use crate::config::{LlmProvider, SummarizerConfig};

use super::llm::{AnthropicClient, GeminiClient, LlmClient, LlmError, OllamaClient};

/// Builds the configured LLM client.
///
/// Hosted providers need an API key, from the config or from the provider's
/// environment variable.
pub fn create_llm_client(config: &SummarizerConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    let timeout = Duration::from_secs(config.timeout_secs);
    let model = config.model_name();

    let require_key = || {
        config.resolved_api_key().ok_or_else(|| {
            LlmError::NotConfigured(format!(
                "no API key for {:?}; set summarizer.api_key or {}",
                config.provider,
                config.provider.api_key_env().unwrap_or("an API key")
            ))
        })
    };

    let client: Arc<dyn LlmClient> = match config.provider {
        LlmProvider::Gemini => {
            let mut client = GeminiClient::new(require_key()?, model).with_timeout(timeout);
            if let Some(base) = &config.api_base {
                client = client.with_api_base(base);
            }
            Arc::new(client)
        }
        LlmProvider::Anthropic => {
            let mut client = AnthropicClient::new(require_key()?, model).with_timeout(timeout);
            if let Some(base) = &config.api_base {
                client = client.with_api_base(base);
            }
            Arc::new(client)
        }
        LlmProvider::Ollama => {
            let mut client = OllamaClient::new(model).with_timeout(timeout);
            if let Some(base) = &config.api_base {
                client = client.with_api_base(base);
            }
            Arc::new(client)
        }
    };
    Ok(client)
}
