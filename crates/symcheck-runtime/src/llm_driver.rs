//! LLM driver trait and types.
//!
//! Abstracts over completion providers so the fallback selector and tests
//! can swap in any backend.

use async_trait::async_trait;
use symcheck_types::message::{Message, StopReason, TokenUsage};
use thiserror::Error;

/// Error type for LLM driver operations.
#[derive(Error, Debug)]
pub enum LlmError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(String),
    /// API returned an error.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },
    /// Rate limited or out of quota.
    #[error("Rate limited, retry after {retry_after_ms}ms")]
    RateLimited {
        /// How long the provider asked us to wait.
        retry_after_ms: u64,
    },
    /// Response parsing failed.
    #[error("Parse error: {0}")]
    Parse(String),
    /// Driver cannot be built from the given configuration.
    #[error("Driver configuration error: {0}")]
    Config(String),
    /// No API key configured.
    #[error("Missing API key: {0}")]
    MissingApiKey(String),
    /// Model overloaded or temporarily unavailable.
    #[error("Model overloaded, retry after {retry_after_ms}ms")]
    Overloaded {
        /// How long the provider asked us to wait.
        retry_after_ms: u64,
    },
}

/// A request to an LLM for completion.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation messages, not including the system prompt.
    pub messages: Vec<Message>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature. Provider default when `None`.
    pub temperature: Option<f32>,
    /// System prompt.
    pub system: Option<String>,
}

/// A response from an LLM completion.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated text, trimmed of surrounding whitespace.
    pub text: String,
    /// Why the model stopped generating.
    pub stop_reason: StopReason,
    /// Token usage statistics.
    pub usage: TokenUsage,
}

/// Trait for LLM drivers.
#[async_trait]
pub trait LlmDriver: Send + Sync {
    /// Send a completion request and get a response.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

/// Configuration for creating an LLM driver.
#[derive(Clone)]
pub struct DriverConfig {
    /// Provider name.
    pub provider: String,
    /// API key.
    pub api_key: Option<String>,
    /// Base URL override.
    pub base_url: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// SECURITY: Custom Debug impl redacts the API key.
impl std::fmt::Debug for DriverConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_config_debug_redacts_key() {
        let config = DriverConfig {
            provider: "groq".to_string(),
            api_key: Some("gsk_secret".to_string()),
            base_url: None,
            timeout_secs: 30,
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("gsk_secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_error_display() {
        let err = LlmError::Api {
            status: 401,
            message: "Invalid API Key".to_string(),
        };
        assert_eq!(err.to_string(), "API error (401): Invalid API Key");
    }
}
