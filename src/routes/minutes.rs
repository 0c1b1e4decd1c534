use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::analysis::{self, AnalysisRequest, AnalysisResponse};
use crate::error::AppResult;

#[derive(Debug, Deserialize)]
pub struct MinutesBody {
    pub minutes_text: String,
    pub meeting_type: Option<String>,
    pub participants: Option<String>,
}

impl From<MinutesBody> for AnalysisRequest {
    fn from(body: MinutesBody) -> Self {
        AnalysisRequest::new(body.minutes_text, body.meeting_type, body.participants)
    }
}

#[derive(Debug, Serialize)]
pub struct QuickAdviceResponse {
    pub advice: String,
}

pub async fn analyze_minutes(
    State(state): State<AppState>,
    body: Result<Json<MinutesBody>, JsonRejection>,
) -> AppResult<Json<AnalysisResponse>> {
    let Json(body) = body?;
    let request = AnalysisRequest::from(body);

    let response = analysis::analyze_minutes(
        &state.llm_client,
        state.config.analysis_max_tokens,
        &request,
    )
    .await?;

    Ok(Json(response))
}

pub async fn quick_advice(
    State(state): State<AppState>,
    body: Result<Json<MinutesBody>, JsonRejection>,
) -> AppResult<Json<QuickAdviceResponse>> {
    let Json(body) = body?;
    let request = AnalysisRequest::from(body);

    let advice = analysis::quick_advice(
        &state.llm_client,
        state.config.quick_advice_max_tokens,
        &request,
    )
    .await?;

    Ok(Json(QuickAdviceResponse { advice }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_body_minimal() {
        let body: MinutesBody = serde_json::from_str(r#"{"minutes_text": "テスト"}"#).unwrap();
        let request = AnalysisRequest::from(body);
        assert_eq!(request.text, "テスト");
        assert_eq!(request.meeting_type, "regular");
        assert_eq!(request.participants, "");
    }

    #[test]
    fn test_minutes_body_full() {
        let body: MinutesBody = serde_json::from_str(
            r#"{"minutes_text": "x", "meeting_type": "1on1", "participants": "鈴木, 高橋"}"#,
        )
        .unwrap();
        let request = AnalysisRequest::from(body);
        assert_eq!(request.meeting_type, "1on1");
        assert_eq!(request.participants, "鈴木, 高橋");
    }

    #[test]
    fn test_minutes_body_requires_text() {
        let result = serde_json::from_str::<MinutesBody>(r#"{"meeting_type": "regular"}"#);
        assert!(result.is_err());
    }
}
