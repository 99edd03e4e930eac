//! Mock LLM client and text source for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::format::FormatDescriptor;
use crate::summarize::{
    CompletionRequest, CompletionResponse, LlmClient, LlmError, LlmUsage, SummarizeError,
    TextSource,
};

/// Mock implementation of the LlmClient trait.
///
/// Returns a fixed response and records every request.
#[derive(Debug)]
pub struct MockLlm {
    response: Arc<RwLock<String>>,
    requests: Arc<RwLock<Vec<CompletionRequest>>>,
    next_error: Arc<RwLock<Option<LlmError>>>,
}

impl Default for MockLlm {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLlm {
    pub fn new() -> Self {
        Self::with_response("This is a mock summary of the supplied document.")
    }

    pub fn with_response(response: impl Into<String>) -> Self {
        Self {
            response: Arc::new(RwLock::new(response.into())),
            requests: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn set_response(&self, response: impl Into<String>) {
        *self.response.write().await = response.into();
    }

    pub async fn set_next_error(&self, error: LlmError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.write().await.push(request);
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        Ok(CompletionResponse {
            text: self.response.read().await.clone(),
            usage: LlmUsage::default(),
            model: "mock-model".to_string(),
        })
    }
}

/// Mock implementation of the TextSource trait.
///
/// Returns configured text per file name, or the file's own contents.
#[derive(Debug, Default)]
pub struct MockTextSource {
    texts: Arc<RwLock<HashMap<String, String>>>,
    extracted: Arc<RwLock<Vec<PathBuf>>>,
}

impl MockTextSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_text(&self, file_name: &str, text: impl Into<String>) {
        self.texts
            .write()
            .await
            .insert(file_name.to_string(), text.into());
    }

    pub async fn extracted(&self) -> Vec<PathBuf> {
        self.extracted.read().await.clone()
    }
}

#[async_trait]
impl TextSource for MockTextSource {
    async fn extract_text(
        &self,
        input: &Path,
        _format: &FormatDescriptor,
        _work_dir: &Path,
    ) -> Result<String, SummarizeError> {
        self.extracted.write().await.push(input.to_path_buf());
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if let Some(text) = self.texts.read().await.get(&name) {
            return Ok(text.clone());
        }
        let bytes = tokio::fs::read(input).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
