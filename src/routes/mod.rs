pub mod health;
pub mod minutes;
pub mod relay;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/analyze-minutes", post(minutes::analyze_minutes))
        .route("/quick-advice", post(minutes::quick_advice))
        .route("/claude", post(relay::relay))
        .with_state(state)
}
