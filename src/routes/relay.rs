use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::Deserialize;
use serde_json::Value;

use crate::AppState;
use crate::analysis;
use crate::error::AppResult;

#[derive(Debug, Deserialize)]
pub struct RelayBody {
    pub message: String,
}

pub async fn relay(
    State(state): State<AppState>,
    body: Result<Json<RelayBody>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let Json(body) = body?;

    let envelope = analysis::relay_message(
        &state.llm_client,
        state.config.relay_max_tokens,
        body.message,
    )
    .await?;

    Ok(Json(envelope))
}
