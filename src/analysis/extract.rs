use serde_json::Value;
use thiserror::Error;

use super::model::MinutesAnalysis;

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("model returned an empty response")]
    EmptyOutput,
}

/// Result of pulling JSON out of free-form model text.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedJson {
    Parsed(Value),
    /// Nothing parseable; carries the original text unchanged.
    Raw(String),
}

/// Model reply coerced into the analysis shape, or the degraded fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Structured(MinutesAnalysis),
    RawFallback(String),
}

impl Extraction {
    pub fn outcome(&self) -> &'static str {
        match self {
            Extraction::Structured(_) => "structured",
            Extraction::RawFallback(_) => "raw_fallback",
        }
    }
}

/// Picks the JSON candidate: a ```json fence interior, else the greedy
/// first-`{`-to-last-`}` span, else the whole text.
fn candidate(content: &str) -> &str {
    if let Some(start) = content.find(JSON_FENCE) {
        let body_start = start + JSON_FENCE.len();
        if let Some(end) = content[body_start..].find(FENCE) {
            return content[body_start..body_start + end].trim();
        }
    }
    if let Some(start) = content.find('{')
        && let Some(end) = content.rfind('}')
        && start < end
    {
        return &content[start..=end];
    }
    content
}

pub fn extract_json(content: &str) -> Result<ExtractedJson, ExtractionError> {
    if content.trim().is_empty() {
        return Err(ExtractionError::EmptyOutput);
    }

    match serde_json::from_str::<Value>(candidate(content)) {
        Ok(value) => Ok(ExtractedJson::Parsed(value)),
        Err(err) => {
            tracing::warn!(
                error = %err,
                content_chars = content.chars().count(),
                "Model reply is not valid JSON, using raw fallback"
            );
            Ok(ExtractedJson::Raw(content.to_string()))
        }
    }
}

pub fn extract_analysis(content: &str) -> Result<Extraction, ExtractionError> {
    let value = match extract_json(content)? {
        ExtractedJson::Parsed(value) => value,
        ExtractedJson::Raw(raw) => return Ok(Extraction::RawFallback(raw)),
    };

    if !value.is_object() {
        tracing::warn!("Model reply JSON is not an object, using raw fallback");
        return Ok(Extraction::RawFallback(content.to_string()));
    }

    match serde_json::from_value::<MinutesAnalysis>(value) {
        Ok(analysis) => Ok(Extraction::Structured(analysis)),
        Err(err) => {
            tracing::warn!(
                error = %err,
                "Model reply JSON does not match the analysis shape, using raw fallback"
            );
            Ok(Extraction::RawFallback(content.to_string()))
        }
    }
}
