use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::AppState;

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Meeting Minutes Analyzer API",
        "endpoints": {
            "/analyze-minutes": "POST - 議事録を分析し、構造化されたレポートを返します",
            "/quick-advice": "POST - 次回会議へのアドバイスを3点返します",
            "/claude": "POST - メッセージをClaude APIへそのまま中継します",
            "/health": "GET - ヘルスチェック",
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "api_key_configured": state.config.api_key_configured(),
    }))
}
