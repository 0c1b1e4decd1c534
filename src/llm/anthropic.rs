use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use super::client::truncate;
use super::{GenerateRequest, GenerateResponse, Provider, UpstreamError};
use crate::config::Config;

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    messages_url: String,
    timeout: Duration,
}

impl AnthropicProvider {
    pub fn new(
        api_key: Option<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(UpstreamError::Transport)?;

        Ok(Self {
            client,
            api_key,
            messages_url: format!("{}/v1/messages", base_url.trim_end_matches('/')),
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, UpstreamError> {
        Self::new(
            config.anthropic_api_key.clone(),
            &config.anthropic_base_url,
            config.upstream_timeout(),
        )
    }

    fn headers(&self) -> Result<HeaderMap, UpstreamError> {
        let api_key = self.api_key.as_deref().ok_or(UpstreamError::MissingApiKey)?;

        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key).map_err(|_| UpstreamError::InvalidApiKey)?;
        key.set_sensitive(true);
        headers.insert("x-api-key", key);
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn transport_error(&self, err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout(self.timeout.as_secs())
        } else {
            UpstreamError::Transport(err)
        }
    }
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
    model: String,
    #[serde(default)]
    usage: AnthropicUsage,
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Deserialize, Default)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Deserialize)]
struct AnthropicError {
    error: AnthropicErrorDetail,
}

#[derive(Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}

#[async_trait::async_trait]
impl Provider for AnthropicProvider {
    async fn generate(&self, req: &GenerateRequest) -> Result<GenerateResponse, UpstreamError> {
        let headers = self.headers()?;

        let body = AnthropicRequest {
            model: &req.model,
            max_tokens: req.max_tokens,
            messages: vec![AnthropicMessage {
                role: "user",
                content: &req.prompt,
            }],
        };

        tracing::info!(
            url = %self.messages_url,
            model = %req.model,
            max_tokens = req.max_tokens,
            prompt_chars = req.prompt.chars().count(),
            prompt_preview = %truncate(&req.prompt, 200),
            "Sending request to Claude API"
        );

        let response = self
            .client
            .post(&self.messages_url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;

        tracing::info!(
            status = status.as_u16(),
            body_preview = %truncate(&raw, 500),
            "Received response from Claude API"
        );

        if !status.is_success() {
            let message = match serde_json::from_str::<AnthropicError>(&raw) {
                Ok(err) => err.error.message,
                Err(_) => raw,
            };
            return Err(UpstreamError::Status { status, message });
        }

        let envelope: serde_json::Value =
            serde_json::from_str(&raw).map_err(|e| UpstreamError::Envelope(e.to_string()))?;
        let resp: AnthropicResponse = serde_json::from_value(envelope.clone())
            .map_err(|e| UpstreamError::Envelope(e.to_string()))?;

        let content = resp
            .content
            .iter()
            .filter(|c| c.content_type == "text")
            .filter_map(|c| c.text.as_deref())
            .collect::<Vec<_>>()
            .join("");

        Ok(GenerateResponse {
            content,
            model: resp.model,
            input_tokens: resp.usage.input_tokens,
            output_tokens: resp.usage.output_tokens,
            finish_reason: resp.stop_reason.unwrap_or_default(),
            envelope,
        })
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    fn request(prompt: &str) -> GenerateRequest {
        GenerateRequest {
            model: "claude-3-opus-20240229".to_string(),
            prompt: prompt.to_string(),
            max_tokens: 1000,
            operation: "test",
        }
    }

    fn provider(server_url: &str, api_key: Option<&str>) -> AnthropicProvider {
        AnthropicProvider::new(
            api_key.map(str::to_string),
            server_url,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_generate_sends_messages_contract() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "test-key")
            .match_header("anthropic-version", "2023-06-01")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({
                "model": "claude-3-opus-20240229",
                "max_tokens": 1000,
                "messages": [{"role": "user", "content": "hello"}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "id": "msg_01",
                    "type": "message",
                    "role": "assistant",
                    "model": "claude-3-opus-20240229",
                    "content": [
                        {"type": "text", "text": "Hello, "},
                        {"type": "text", "text": "world"}
                    ],
                    "stop_reason": "end_turn",
                    "usage": {"input_tokens": 12, "output_tokens": 4}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let result = provider(&server.url(), Some("test-key"))
            .generate(&request("hello"))
            .await;
        let resp = assert_ok!(result);

        mock.assert_async().await;
        assert_eq!(resp.content, "Hello, world");
        assert_eq!(resp.model, "claude-3-opus-20240229");
        assert_eq!(resp.input_tokens, 12);
        assert_eq!(resp.output_tokens, 4);
        assert_eq!(resp.finish_reason, "end_turn");
        assert_eq!(resp.envelope["id"], "msg_01");
    }

    #[tokio::test]
    async fn test_generate_ignores_non_text_blocks() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(
                json!({
                    "model": "claude-3-opus-20240229",
                    "content": [
                        {"type": "tool_use", "id": "tool_1", "name": "x", "input": {}},
                        {"type": "text", "text": "only text"}
                    ],
                    "usage": {"input_tokens": 1, "output_tokens": 1}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let resp = provider(&server.url(), Some("k"))
            .generate(&request("hi"))
            .await
            .unwrap();
        assert_eq!(resp.content, "only text");
        assert_eq!(resp.finish_reason, "");
    }

    #[tokio::test]
    async fn test_generate_rate_limited() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(429)
            .with_body(
                json!({
                    "type": "error",
                    "error": {"type": "rate_limit_error", "message": "rate limited"}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let result = provider(&server.url(), Some("k"))
            .generate(&request("hi"))
            .await;
        let err = assert_err!(result);

        assert_eq!(err.kind(), "rate_limit");
        assert_eq!(
            err.to_string(),
            "Claude API error (429 Too Many Requests): rate limited"
        );
    }

    #[tokio::test]
    async fn test_generate_non_json_error_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(502)
            .with_body("upstream gateway failure")
            .create_async()
            .await;

        let err = provider(&server.url(), Some("k"))
            .generate(&request("hi"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "server_error");
        assert!(err.to_string().contains("upstream gateway failure"));
    }

    #[tokio::test]
    async fn test_generate_malformed_envelope() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(r#"{"unexpected": true}"#)
            .create_async()
            .await;

        let err = provider(&server.url(), Some("k"))
            .generate(&request("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Envelope(_)));
    }

    #[tokio::test]
    async fn test_generate_without_api_key_makes_no_call() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .expect(0)
            .create_async()
            .await;

        let err = provider(&server.url(), None)
            .generate(&request("hi"))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, UpstreamError::MissingApiKey));
    }

    #[tokio::test]
    async fn test_generate_rejects_unusable_api_key() {
        let err = provider("http://127.0.0.1:9", Some("bad\nkey"))
            .generate(&request("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::InvalidApiKey));
    }

    #[tokio::test]
    async fn test_generate_times_out_on_silent_upstream() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Accept connections and hold them open without ever answering.
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let provider = AnthropicProvider::new(
            Some("k".to_string()),
            &format!("http://{addr}"),
            Duration::from_secs(1),
        )
        .unwrap();

        let err = assert_err!(provider.generate(&request("hi")).await);
        server.abort();

        assert!(matches!(err, UpstreamError::Timeout(1)), "{err:?}");
        assert_eq!(err.kind(), "timeout");
        assert_eq!(err.to_string(), "Claude API request timed out after 1s");
    }

    #[test]
    fn test_messages_url_trims_trailing_slash() {
        let provider = provider("http://localhost:1234/", Some("k"));
        assert_eq!(provider.messages_url, "http://localhost:1234/v1/messages");
    }
}
