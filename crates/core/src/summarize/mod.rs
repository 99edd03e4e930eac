//! Document and recording summarization.
//!
//! Text comes from a [`TextSource`] (pandoc or pdftotext for documents,
//! whisper for audio and video) and the summary from an [`LlmClient`].

mod error;
mod factory;
mod llm;
mod prompt;
mod source;
mod summarizer;
mod types;

pub use error::SummarizeError;
pub use factory::create_llm_client;
pub use llm::{
    AnthropicClient, CompletionRequest, CompletionResponse, GeminiClient, LlmClient, LlmError,
    LlmUsage, OllamaClient,
};
pub use prompt::{render_prompt, FileDetails, DEFAULT_TEMPLATE};
pub use source::{TextSource, ToolTextSource};
pub use summarizer::{Summarizer, SummarizerSettings};
pub use types::{LengthPreset, SummaryLength, SummaryResult};
