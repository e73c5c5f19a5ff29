//! Streaming generation layer for local-analyst
//!
//! This crate provides a provider-agnostic way to ask a locally hosted
//! language model for text and receive it incrementally. It includes:
//!
//! - Generation request type and builder
//! - The [`GenerationProvider`] trait and the [`FragmentStream`] it returns
//! - Line-oriented stream decoding shared by the HTTP providers
//! - A tracing wrapper that instruments any provider without changing its output
//! - Concrete providers for Ollama and OpenAI-compatible servers (behind feature flags)

pub mod error;
pub mod provider;
pub mod request;
pub mod stream;
pub mod traced;

pub use error::{LLMError, Result};
pub use provider::{FragmentStream, GenerationProvider};
pub use request::{GenerationRequest, GenerationRequestBuilder};
pub use traced::TracedProvider;

// Provider implementations (feature-gated)
#[cfg(any(feature = "ollama", feature = "openai"))]
pub mod providers;
