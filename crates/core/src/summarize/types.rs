use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Requested summary length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLength {
    Short,
    #[default]
    Medium,
    Long,
}

/// Generation settings for one [`SummaryLength`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthPreset {
    /// Substituted for `{{SUMMARY_REQUIREMENTS}}` in the prompt.
    pub description: &'static str,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl SummaryLength {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
        }
    }

    pub fn preset(&self) -> LengthPreset {
        match self {
            Self::Short => LengthPreset {
                description: "a brief summary in 2-3 sentences",
                max_tokens: 1000,
                temperature: 0.5,
            },
            Self::Medium => LengthPreset {
                description: "a concise summary in 1-2 paragraphs",
                max_tokens: 2000,
                temperature: 0.7,
            },
            Self::Long => LengthPreset {
                description: "a detailed summary in 3-4 paragraphs",
                max_tokens: 4000,
                temperature: 0.8,
            },
        }
    }
}

impl fmt::Display for SummaryLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SummaryLength {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "medium" => Ok(Self::Medium),
            "long" => Ok(Self::Long),
            other => Err(format!(
                "unknown summary length {:?} (expected short, medium or long)",
                other
            )),
        }
    }
}

/// A written summary.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryResult {
    pub summary_path: PathBuf,
    pub summary: String,
    pub length: SummaryLength,
    /// Characters of source text sent to the model.
    pub input_chars: usize,
    pub model: String,
    pub duration_ms: u64,
}
