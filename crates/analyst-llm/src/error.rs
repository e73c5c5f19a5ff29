//! Error types for generation operations

use thiserror::Error;

/// Result type for generation operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur while opening or consuming a generation stream
#[derive(Error, Debug)]
pub enum LLMError {
    /// The generation backend could not be reached
    #[error("Generation backend unavailable at {endpoint}: {reason}")]
    ModelUnavailable { endpoint: String, reason: String },

    /// The backend is up but the model is not loaded or pulled
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Invalid API key or authentication failed
    #[error("Invalid API key or authentication failed")]
    AuthenticationFailed,

    /// API request failed
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The stream broke off after it was opened
    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Unexpected response format
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl LLMError {
    /// Whether this error means the model cannot serve requests right now
    ///
    /// Covers an unreachable server and a model that is not loaded.
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::ModelUnavailable { .. } | Self::ModelNotFound(_) => true,
            Self::HttpError(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }

    /// Classify a transport error raised while sending a request
    pub(crate) fn from_send(endpoint: &str, err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::ModelUnavailable {
                endpoint: endpoint.to_string(),
                reason: err.to_string(),
            }
        } else {
            Self::HttpError(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_classification() {
        let err = LLMError::ModelUnavailable {
            endpoint: "http://localhost:11434".to_string(),
            reason: "connection refused".to_string(),
        };
        assert!(err.is_unavailable());
        assert!(LLMError::ModelNotFound("gemma3:1b".to_string()).is_unavailable());
        assert!(!LLMError::StreamInterrupted("eof".to_string()).is_unavailable());
        assert!(!LLMError::InvalidRequest("empty prompt".to_string()).is_unavailable());
    }

    #[test]
    fn test_error_display() {
        let err = LLMError::ModelNotFound("llama3.1".to_string());
        assert_eq!(err.to_string(), "Model not found: llama3.1");
    }
}
