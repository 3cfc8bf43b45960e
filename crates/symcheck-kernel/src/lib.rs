//! The symcheck kernel.
//!
//! Owns the long-lived pieces (fallback selector, history store, counters)
//! and exposes the analysis flow and history operations used by the API
//! and the CLI.

pub mod error;
pub mod kernel;

pub use error::KernelError;
pub use kernel::{open_history, AnalysisRecorded, KernelHealth, SymcheckKernel};
