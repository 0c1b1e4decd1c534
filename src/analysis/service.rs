use opentelemetry::KeyValue;

use crate::error::AppError;
use crate::llm::{GenerateResponse, LlmClient, UpstreamError};
use crate::telemetry::metrics::{MINUTES_ANALYSES, MINUTES_TEXT_LENGTH};

use super::extract::{Extraction, ExtractionError, extract_analysis};
use super::format::format_report;
use super::model::{AnalysisRequest, AnalysisResponse, MinutesAnalysis};
use super::prompt::{build_analysis_prompt, build_quick_advice_prompt};

pub const PARSE_FAILURE_NOTICE: &str =
    "AIの応答をJSONとして解析できませんでした。元の応答を formatted_report に記載しています。";

async fn complete(
    llm_client: &LlmClient,
    operation: &'static str,
    prompt: String,
    max_tokens: u32,
) -> Result<GenerateResponse, UpstreamError> {
    let request = llm_client.request(operation, prompt, max_tokens);
    llm_client.generate(&request).await
}

fn record_text_length(request: &AnalysisRequest) {
    MINUTES_TEXT_LENGTH.record(request.text.chars().count() as f64, &[]);
}

/// Shapes an extraction into the wire response. Raw fallbacks keep every
/// structured field empty and carry the model text unchanged.
pub fn build_response(extraction: Extraction) -> AnalysisResponse {
    let formatted_report = format_report(&extraction);
    match extraction {
        Extraction::Structured(analysis) => AnalysisResponse {
            analysis,
            formatted_report,
            raw_response: None,
        },
        Extraction::RawFallback(raw) => AnalysisResponse {
            analysis: MinutesAnalysis {
                meeting_summary: PARSE_FAILURE_NOTICE.to_string(),
                ..MinutesAnalysis::default()
            },
            formatted_report,
            raw_response: Some(raw),
        },
    }
}

#[tracing::instrument(
    name = "pipeline analyze_minutes",
    skip(llm_client, request),
    fields(
        minutes.meeting_type = %request.meeting_type,
        minutes.text_chars = request.text.chars().count(),
        analysis.outcome,
    )
)]
pub async fn analyze_minutes(
    llm_client: &LlmClient,
    max_tokens: u32,
    request: &AnalysisRequest,
) -> Result<AnalysisResponse, AppError> {
    record_text_length(request);

    let prompt = build_analysis_prompt(request);
    let resp = complete(llm_client, "analyze_minutes", prompt, max_tokens).await?;

    let extraction = extract_analysis(&resp.content).map_err(|e| match e {
        ExtractionError::EmptyOutput => UpstreamError::EmptyCompletion,
    })?;

    let outcome = extraction.outcome();
    tracing::Span::current().record("analysis.outcome", outcome);
    MINUTES_ANALYSES.add(1, &[KeyValue::new("analysis.outcome", outcome)]);

    tracing::info!(outcome, model = %resp.model, "Minutes analysis completed");

    Ok(build_response(extraction))
}

#[tracing::instrument(
    name = "pipeline quick_advice",
    skip(llm_client, request),
    fields(
        minutes.meeting_type = %request.meeting_type,
        minutes.text_chars = request.text.chars().count(),
    )
)]
pub async fn quick_advice(
    llm_client: &LlmClient,
    max_tokens: u32,
    request: &AnalysisRequest,
) -> Result<String, AppError> {
    record_text_length(request);

    let prompt = build_quick_advice_prompt(request);
    let resp = complete(llm_client, "quick_advice", prompt, max_tokens).await?;

    Ok(resp.content)
}

/// Sends `message` as-is and returns the upstream envelope untouched.
#[tracing::instrument(name = "pipeline relay", skip(llm_client, message))]
pub async fn relay_message(
    llm_client: &LlmClient,
    max_tokens: u32,
    message: String,
) -> Result<serde_json::Value, AppError> {
    let resp = complete(llm_client, "relay", message, max_tokens).await?;
    Ok(resp.envelope)
}
