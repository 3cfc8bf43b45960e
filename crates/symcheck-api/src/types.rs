//! Request and response bodies for the HTTP API.

use serde::{Deserialize, Serialize};
use symcheck_kernel::KernelHealth;

/// Body of `POST /analyze`.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
}

/// Response of `POST /analyze`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub result: String,
}

/// Query of `GET /history`.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub keyword: Option<String>,
}

/// Plain acknowledgement body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response of `GET /api/health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    #[serde(flatten)]
    pub kernel: KernelHealth,
    pub uptime_secs: u64,
}
