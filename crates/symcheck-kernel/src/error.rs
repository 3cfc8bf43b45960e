//! Kernel error type.

use symcheck_memory::MemoryError;
use symcheck_runtime::llm_driver::LlmError;
use symcheck_types::config::ConfigError;
use thiserror::Error;

/// Errors raised while booting the kernel or serving a request.
#[derive(Error, Debug)]
pub enum KernelError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    /// The completion credential variable is unset or blank.
    #[error("Missing API key: set the {0} environment variable")]
    MissingApiKey(String),
    #[error("Driver error: {0}")]
    Driver(#[from] LlmError),
    #[error("History error: {0}")]
    Memory(#[from] MemoryError),
    /// A blocking store task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(String),
}

impl KernelError {
    /// True when the error is a history lookup miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, KernelError::Memory(MemoryError::NotFound(_)))
    }
}
