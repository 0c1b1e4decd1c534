pub mod anthropic;
pub mod client;

use reqwest::StatusCode;
use thiserror::Error;

pub use anthropic::AnthropicProvider;
pub use client::LlmClient;

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub operation: &'static str,
}

#[derive(Debug, Clone)]
pub struct GenerateResponse {
    pub content: String,
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub finish_reason: String,
    /// Decoded upstream envelope, returned as-is by the direct relay.
    pub envelope: serde_json::Value,
}

/// Failure of the single outbound call. Never retried.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("Claude API key is not configured")]
    MissingApiKey,

    #[error("Claude API key contains characters not allowed in a header")]
    InvalidApiKey,

    #[error("Claude API request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Claude API request timed out after {0}s")]
    Timeout(u64),

    #[error("Claude API error ({status}): {message}")]
    Status { status: StatusCode, message: String },

    #[error("Claude API returned an unreadable response: {0}")]
    Envelope(String),

    #[error("Claude API returned no text content")]
    EmptyCompletion,
}

impl UpstreamError {
    /// Value recorded as `error.type` on spans and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::MissingApiKey | UpstreamError::InvalidApiKey => "auth_error",
            UpstreamError::Transport(_) => "network_error",
            UpstreamError::Timeout(_) => "timeout",
            UpstreamError::Status { status, .. } => match status.as_u16() {
                429 => "rate_limit",
                401 | 403 => "auth_error",
                400 | 404 | 413 | 422 => "invalid_request",
                s if s >= 500 => "server_error",
                _ => "unknown_error",
            },
            UpstreamError::Envelope(_) => "decode_error",
            UpstreamError::EmptyCompletion => "empty_completion",
        }
    }
}

#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    async fn generate(&self, req: &GenerateRequest) -> Result<GenerateResponse, UpstreamError>;
    fn name(&self) -> &str;
}
