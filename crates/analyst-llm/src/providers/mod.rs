//! Concrete generation provider implementations
//!
//! This module contains implementations of the GenerationProvider trait for
//! local inference servers.

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "ollama")]
pub use ollama::{OllamaConfig, OllamaProvider};

#[cfg(feature = "openai")]
pub use openai::{OpenAIConfig, OpenAIProvider};
