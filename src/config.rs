use std::env;
use std::time::Duration;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub environment: String,
    pub anthropic_api_key: Option<String>,
    pub anthropic_base_url: String,
    pub anthropic_model: String,
    pub analysis_max_tokens: u32,
    pub quick_advice_max_tokens: u32,
    pub relay_max_tokens: u32,
    pub upstream_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub otel_service_name: String,
    pub otel_exporter_endpoint: String,
    pub otel_sdk_disabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            environment: "development".to_string(),
            anthropic_api_key: None,
            anthropic_base_url: "https://api.anthropic.com".to_string(),
            anthropic_model: "claude-3-opus-20240229".to_string(),
            analysis_max_tokens: 2000,
            quick_advice_max_tokens: 1000,
            relay_max_tokens: 1000,
            upstream_timeout_secs: 30,
            request_timeout_secs: 60,
            otel_service_name: "meeting-minutes-relay".to_string(),
            otel_exporter_endpoint: "http://localhost:4317".to_string(),
            otel_sdk_disabled: false,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        Ok(Self {
            port: parse_var("APP_PORT", defaults.port)?,
            environment: env::var("APP_ENVIRONMENT").unwrap_or(defaults.environment),
            anthropic_api_key: env::var("ANTHROPIC_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            anthropic_base_url: env::var("ANTHROPIC_BASE_URL")
                .unwrap_or(defaults.anthropic_base_url),
            anthropic_model: env::var("ANTHROPIC_MODEL").unwrap_or(defaults.anthropic_model),
            analysis_max_tokens: parse_var("ANALYSIS_MAX_TOKENS", defaults.analysis_max_tokens)?,
            quick_advice_max_tokens: parse_var(
                "QUICK_ADVICE_MAX_TOKENS",
                defaults.quick_advice_max_tokens,
            )?,
            relay_max_tokens: parse_var("RELAY_MAX_TOKENS", defaults.relay_max_tokens)?,
            upstream_timeout_secs: parse_var(
                "UPSTREAM_TIMEOUT_SECS",
                defaults.upstream_timeout_secs,
            )?,
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)?,
            otel_service_name: env::var("OTEL_SERVICE_NAME").unwrap_or(defaults.otel_service_name),
            otel_exporter_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or(defaults.otel_exporter_endpoint),
            otel_sdk_disabled: env::var("OTEL_SDK_DISABLED")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Presence only; the key is never validated against the API.
    pub fn api_key_configured(&self) -> bool {
        self.anthropic_api_key.is_some()
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} must be a number, got {raw:?}")),
        Err(_) => Ok(default),
    }
}
