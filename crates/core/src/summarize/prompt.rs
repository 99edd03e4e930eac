//! Prompt template rendering.

use serde::Serialize;

const REQUIREMENTS: &str = "{{SUMMARY_REQUIREMENTS}}";
const FILE_DETAILS: &str = "{{FILE_DETAILS}}";

/// Built-in template, used when no template file is configured.
pub const DEFAULT_TEMPLATE: &str = "\
You are a careful assistant that summarizes documents.

Write {{SUMMARY_REQUIREMENTS}} of the document below. Cover its main points \
and conclusions, keep names and figures accurate, and do not add information \
that is not in the document. Reply with the summary text only, without a \
heading or preamble.

Document details:
{{FILE_DETAILS}}
";

/// Describes the source file to the model.
#[derive(Debug, Clone, Serialize)]
pub struct FileDetails {
    pub name: String,
    pub extension: String,
    pub category: String,
    pub size_bytes: u64,
    pub text_chars: usize,
    /// Whether the text was cut to fit the input limit.
    pub truncated: bool,
}

/// Fills the placeholders in `template` and appends the document text.
pub fn render_prompt(
    template: &str,
    requirements: &str,
    details: &FileDetails,
    text: &str,
) -> String {
    let details_json =
        serde_json::to_string_pretty(details).unwrap_or_else(|_| details.name.clone());
    let mut prompt = template
        .replace(REQUIREMENTS, requirements)
        .replace(FILE_DETAILS, &details_json);

    prompt.push_str("\n<document>\n");
    prompt.push_str(text);
    if !text.ends_with('\n') {
        prompt.push('\n');
    }
    prompt.push_str("</document>\n");
    prompt
}

/// Cuts `text` to at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => (&text[..idx], true),
        None => (text, false),
    }
}
