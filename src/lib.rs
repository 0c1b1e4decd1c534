pub mod analysis;
pub mod config;
pub mod error;
pub mod llm;
pub mod routes;
pub mod telemetry;

use std::sync::Arc;

pub use config::Config;

use llm::{AnthropicProvider, LlmClient, UpstreamError};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub llm_client: Arc<LlmClient>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, UpstreamError> {
        let provider = AnthropicProvider::from_config(&config)?;
        let llm_client = Arc::new(LlmClient::new(
            Arc::new(provider),
            config.anthropic_model.clone(),
        ));

        Ok(Self { config, llm_client })
    }
}
