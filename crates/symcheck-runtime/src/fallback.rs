//! Model fallback selection.
//!
//! Tries an ordered list of candidate models against one driver until a
//! candidate succeeds. Failures are logged and skipped; when every candidate
//! fails the selector still returns an outcome, carrying the fixed fallback
//! message and a `degraded` flag.

use crate::llm_driver::{CompletionRequest, LlmDriver};
use crate::prompts::{symptom_prompt, FALLBACK_MESSAGE, SYSTEM_INSTRUCTION};
use serde::Serialize;
use std::sync::Arc;
use symcheck_types::history::NO_MODEL_SUCCEEDED;
use symcheck_types::message::Message;
use tracing::{info, warn};

/// Default upper bound on generated tokens per analysis.
pub const DEFAULT_MAX_TOKENS: u32 = 800;

/// Result of one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisOutcome {
    /// Generated analysis, or [`FALLBACK_MESSAGE`] when degraded.
    pub text: String,
    /// Candidate that produced `text`, or `"none"`.
    pub model_used: String,
    /// True when every candidate failed.
    pub degraded: bool,
    /// Number of candidates tried, including the successful one.
    pub attempts: usize,
}

/// Runs the candidate loop for symptom analysis.
pub struct FallbackSelector {
    driver: Arc<dyn LlmDriver>,
    candidates: Vec<String>,
    max_tokens: u32,
}

impl FallbackSelector {
    /// Create a selector over `candidates`, tried in the given order.
    pub fn new(driver: Arc<dyn LlmDriver>, candidates: Vec<String>) -> Self {
        Self {
            driver,
            candidates,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Override the generated-token bound.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Candidate models in try order.
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    fn request_for(&self, model: &str, symptoms: &str) -> CompletionRequest {
        CompletionRequest {
            model: model.to_string(),
            messages: vec![Message::user(symptom_prompt(symptoms))],
            max_tokens: self.max_tokens,
            temperature: None,
            system: Some(SYSTEM_INSTRUCTION.to_string()),
        }
    }

    /// Analyze symptom text. First successful candidate wins; never fails.
    pub async fn analyze(&self, symptoms: &str) -> AnalysisOutcome {
        for (i, model) in self.candidates.iter().enumerate() {
            info!(model = %model, candidate_index = i, "Trying model");
            match self.driver.complete(self.request_for(model, symptoms)).await {
                Ok(response) => {
                    info!(
                        model = %model,
                        output_tokens = response.usage.output_tokens,
                        "Analysis succeeded"
                    );
                    return AnalysisOutcome {
                        text: response.text,
                        model_used: model.clone(),
                        degraded: false,
                        attempts: i + 1,
                    };
                }
                Err(e) => {
                    warn!(
                        model = %model,
                        candidate_index = i,
                        error = %e,
                        "Model failed, trying next"
                    );
                }
            }
        }

        AnalysisOutcome {
            text: FALLBACK_MESSAGE.to_string(),
            model_used: NO_MODEL_SUCCEEDED.to_string(),
            degraded: true,
            attempts: self.candidates.len(),
        }
    }
}
