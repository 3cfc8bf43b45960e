//! HTTP API server for the symcheck daemon.
//!
//! Exposes symptom analysis and history management as JSON endpoints.
//! The kernel runs in-process; handlers share it through [`routes::AppState`].

pub mod routes;
pub mod server;
pub mod types;
