//! Concrete LLM drivers.

pub mod openai;

use crate::llm_driver::{DriverConfig, LlmDriver, LlmError};
use std::sync::Arc;
use symcheck_types::config::GROQ_BASE_URL;

/// Build a driver for the configured provider.
///
/// Groq and other OpenAI-compatible services share one wire format, so
/// they differ only in base URL.
pub fn create_driver(config: &DriverConfig) -> Result<Arc<dyn LlmDriver>, LlmError> {
    let api_key = config
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| LlmError::MissingApiKey(config.provider.clone()))?
        .to_string();

    let base_url = match (config.provider.as_str(), config.base_url.as_deref()) {
        (_, Some(url)) if !url.trim().is_empty() => url.trim().to_string(),
        ("groq", _) => GROQ_BASE_URL.to_string(),
        (other, _) => {
            return Err(LlmError::Config(format!(
                "Provider '{other}' requires an explicit base_url"
            )))
        }
    };

    let driver = openai::OpenAiCompatDriver::new(api_key, base_url, config.timeout_secs)?;
    Ok(Arc::new(driver))
}
