//! Shared utilities for local-analyst
//!
//! This crate provides common functionality used across the workspace,
//! including the process-wide logging setup and base configuration.

pub mod config;
pub mod logging;

pub use config::Config;
pub use logging::{LogFormat, init_tracing, init_tracing_with, is_initialized};
