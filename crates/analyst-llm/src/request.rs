//! Generation request type

use serde::{Deserialize, Serialize};

/// Request for a single streamed generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model identifier as the backend knows it (e.g. "gemma3:1b")
    pub model: String,

    /// Fully rendered prompt text
    pub prompt: String,

    /// Optional system prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Upper bound on generated tokens; backend default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,
}

impl GenerationRequest {
    /// Create a request with no sampling overrides
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self::builder(model, prompt).build()
    }

    /// Create a builder for generation requests
    pub fn builder(model: impl Into<String>, prompt: impl Into<String>) -> GenerationRequestBuilder {
        GenerationRequestBuilder::new(model, prompt)
    }

    /// Reject requests no backend could serve
    pub fn validate(&self) -> crate::Result<()> {
        if self.model.trim().is_empty() {
            return Err(crate::LLMError::InvalidRequest(
                "model identifier is empty".to_string(),
            ));
        }
        if self.prompt.trim().is_empty() {
            return Err(crate::LLMError::InvalidRequest("prompt is empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for GenerationRequest
pub struct GenerationRequestBuilder {
    model: String,
    prompt: String,
    system: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<usize>,
}

impl GenerationRequestBuilder {
    /// Create a new builder
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum tokens
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Build the generation request
    pub fn build(self) -> GenerationRequest {
        GenerationRequest {
            model: self.model,
            prompt: self.prompt,
            system: self.system,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}
