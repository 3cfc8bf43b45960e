//! OpenAI-compatible chat completions driver.
//!
//! Speaks the `/chat/completions` wire format used by Groq and other
//! OpenAI-compatible hosts:
//! - Auth via `Authorization: Bearer <key>`
//! - System prompt as the first `system` message
//! - Response: `choices[0].message.content`
//!
//! Each call is a single attempt. Rate limits and overloads are reported
//! as typed errors and left to the caller.

use crate::llm_driver::{CompletionRequest, CompletionResponse, LlmDriver, LlmError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use symcheck_types::message::{Message, StopReason, TokenUsage};
use tracing::debug;
use zeroize::Zeroizing;

const DEFAULT_RETRY_AFTER_MS: u64 = 5000;

/// Driver for OpenAI-compatible completion APIs.
pub struct OpenAiCompatDriver {
    api_key: Zeroizing<String>,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiCompatDriver {
    /// Create a new driver. A zero timeout leaves reqwest's default in place.
    pub fn new(api_key: String, base_url: String, timeout_secs: u64) -> Result<Self, LlmError> {
        let mut builder = reqwest::Client::builder();
        if timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(timeout_secs));
        }
        let client = builder.build().map_err(|e| LlmError::Http(e.to_string()))?;
        Ok(Self {
            api_key: Zeroizing::new(api_key),
            base_url,
            client,
        })
    }

    fn endpoint_url(&self) -> String {
        let trimmed = self.base_url.trim_end_matches('/');
        if trimmed.ends_with("/chat/completions") {
            trimmed.to_string()
        } else {
            format!("{trimmed}/chat/completions")
        }
    }
}

impl std::fmt::Debug for OpenAiCompatDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatDriver")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

// ── Wire types ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

fn build_messages(request: &CompletionRequest) -> Vec<Message> {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    if let Some(system) = request.system.as_deref().filter(|s| !s.is_empty()) {
        messages.push(Message::system(system));
    }
    messages.extend(request.messages.iter().cloned());
    messages
}

fn convert_response(resp: ChatResponse) -> Result<CompletionResponse, LlmError> {
    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::Parse("No choices in completion response".to_string()))?;

    let text = choice
        .message
        .content
        .ok_or_else(|| LlmError::Parse("Completion message has no content".to_string()))?;

    let stop_reason = match choice.finish_reason.as_deref() {
        Some("length") => StopReason::MaxTokens,
        _ => StopReason::EndTurn,
    };

    let usage = resp
        .usage
        .map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    Ok(CompletionResponse {
        text: text.trim().to_string(),
        stop_reason,
        usage,
    })
}

fn retry_after_ms(headers: &reqwest::header::HeaderMap) -> u64 {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok())
        .map(|secs| (secs * 1000.0) as u64)
        .unwrap_or(DEFAULT_RETRY_AFTER_MS)
}

// ── LlmDriver implementation ──────────────────────────────────────────

#[async_trait]
impl LlmDriver for OpenAiCompatDriver {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = ChatRequest {
            model: &request.model,
            messages: build_messages(&request),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let url = self.endpoint_url();
        debug!(url = %url, model = %request.model, "Sending chat completion request");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.as_str())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;

        let status = resp.status().as_u16();

        if status == 429 {
            return Err(LlmError::RateLimited {
                retry_after_ms: retry_after_ms(resp.headers()),
            });
        }
        if status == 503 {
            return Err(LlmError::Overloaded {
                retry_after_ms: retry_after_ms(resp.headers()),
            });
        }

        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api { status, message });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;
        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::Parse(e.to_string()))?;

        convert_response(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_request(model: &str) -> CompletionRequest {
        CompletionRequest {
            model: model.to_string(),
            messages: vec![Message::user("fever")],
            max_tokens: 800,
            temperature: None,
            system: Some("be careful".to_string()),
        }
    }

    fn driver_for(server: &MockServer) -> OpenAiCompatDriver {
        OpenAiCompatDriver::new("gsk_test".to_string(), format!("{}/v1", server.uri()), 5)
            .unwrap()
    }

    #[test]
    fn test_endpoint_url() {
        let d = OpenAiCompatDriver::new("k".into(), "https://api.groq.com/openai/v1/".into(), 0)
            .unwrap();
        assert_eq!(
            d.endpoint_url(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
        let d = OpenAiCompatDriver::new("k".into(), "http://h/v1/chat/completions".into(), 0)
            .unwrap();
        assert_eq!(d.endpoint_url(), "http://h/v1/chat/completions");
    }

    #[test]
    fn test_debug_hides_key() {
        let d = OpenAiCompatDriver::new("gsk_secret".into(), "http://h".into(), 0).unwrap();
        assert!(!format!("{d:?}").contains("gsk_secret"));
    }

    #[test]
    fn test_request_serialization_puts_system_first() {
        let request = test_request("llama-3.1-8b-instant");
        let body = ChatRequest {
            model: &request.model,
            messages: build_messages(&request),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "llama-3.1-8b-instant");
        assert_eq!(json["max_tokens"], 800);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "be careful");
        assert_eq!(json["messages"][1]["role"], "user");
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_convert_response_trims_and_maps_usage() {
        let resp: ChatResponse = serde_json::from_value(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "\n  Rest well.  \n"}, "finish_reason": "length"}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        }))
        .unwrap();
        let out = convert_response(resp).unwrap();
        assert_eq!(out.text, "Rest well.");
        assert_eq!(out.stop_reason, StopReason::MaxTokens);
        assert_eq!(out.usage.input_tokens, 12);
        assert_eq!(out.usage.output_tokens, 3);
    }

    #[test]
    fn test_convert_response_without_content_is_error() {
        let resp: ChatResponse = serde_json::from_value(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": null}}]
        }))
        .unwrap();
        assert!(matches!(convert_response(resp), Err(LlmError::Parse(_))));

        let resp: ChatResponse = serde_json::from_value(serde_json::json!({"choices": []})).unwrap();
        assert!(matches!(convert_response(resp), Err(LlmError::Parse(_))));
    }

    #[tokio::test]
    async fn test_complete_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer gsk_test"))
            .and(body_partial_json(serde_json::json!({"model": "llama-3.1-8b-instant", "max_tokens": 800})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "  Possible cold.  "}, "finish_reason": "stop"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let out = driver_for(&server)
            .complete(test_request("llama-3.1-8b-instant"))
            .await
            .unwrap();
        assert_eq!(out.text, "Possible cold.");
        assert_eq!(out.stop_reason, StopReason::EndTurn);
    }

    #[tokio::test]
    async fn test_complete_api_error_extracts_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": {"message": "The model `mixtral-8x7b-32768` has been decommissioned", "type": "invalid_request_error"}
            })))
            .mount(&server)
            .await;

        let err = driver_for(&server)
            .complete(test_request("mixtral-8x7b-32768"))
            .await
            .unwrap_err();
        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 404);
                assert!(message.contains("decommissioned"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_complete_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "2"))
            .expect(1)
            .mount(&server)
            .await;

        let err = driver_for(&server)
            .complete(test_request("m"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::RateLimited { retry_after_ms: 2000 }));
    }

    #[tokio::test]
    async fn test_complete_overloaded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = driver_for(&server)
            .complete(test_request("m"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LlmError::Overloaded {
                retry_after_ms: DEFAULT_RETRY_AFTER_MS
            }
        ));
    }

    #[tokio::test]
    async fn test_complete_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = driver_for(&server)
            .complete(test_request("m"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Parse(_)));
    }
}
