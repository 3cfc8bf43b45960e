//! Completion runtime for symcheck.
//!
//! - [`llm_driver`]: the provider-agnostic driver trait and its error type.
//! - [`drivers`]: concrete HTTP drivers.
//! - [`fallback`]: ordered candidate-model selection over a driver.
//! - [`prompts`]: fixed instructions sent with every analysis.

pub mod drivers;
pub mod fallback;
pub mod llm_driver;
pub mod prompts;
