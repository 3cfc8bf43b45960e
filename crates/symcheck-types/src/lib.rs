//! Core types shared across the symcheck workspace.
//!
//! Holds configuration, chat message primitives handed to LLM drivers,
//! and the persisted history record.

pub mod config;
pub mod history;
pub mod message;
