//! Generation provider trait definition

use crate::{GenerationRequest, Result};
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Lazy, ordered sequence of generated text fragments
///
/// A stream is tied to one request and can be consumed once. Dropping it
/// releases the underlying connection, whether it was drained or not.
pub type FragmentStream = BoxStream<'static, Result<String>>;

/// Trait for streaming generation backends
///
/// Implementations open one generation session per call (e.g., a local
/// Ollama daemon or an OpenAI-compatible server such as LM Studio).
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Open a generation session and return its fragment stream
    ///
    /// Fails with [`crate::LLMError::ModelUnavailable`] or
    /// [`crate::LLMError::ModelNotFound`] before any fragment is produced when
    /// the backend or model cannot serve the request.
    async fn open_stream(&self, request: GenerationRequest) -> Result<FragmentStream>;

    /// Get the provider name (e.g., "ollama", "openai")
    fn name(&self) -> &str;
}
