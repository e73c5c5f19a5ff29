//! Error types for the analysis pipeline

use crate::config::Backend;
use analyst_llm::LLMError;
use analyst_prompt::PromptError;
use thiserror::Error;

/// Errors raised while fetching data, building prompts or streaming analysis
#[derive(Debug, Error)]
pub enum AnalystError {
    /// No usable market data for the symbol; the pipeline stops before prompting
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// The local model could not be reached or is not loaded
    #[error("Model {model} unavailable: {reason}")]
    ModelUnavailable { model: String, reason: String },

    /// Invalid stock symbol provided
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Prompt template error
    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    /// Generation failed after the model was reached
    #[error("Generation error: {0}")]
    Generation(#[from] LLMError),

    /// Writing to the dashboard failed
    #[error("Display error: {0}")]
    Display(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinanceError(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, AnalystError>;

impl AnalystError {
    /// Wrap any upstream failure of a fetch as `DataUnavailable`
    pub fn data_unavailable(symbol: impl Into<String>, reason: impl ToString) -> Self {
        Self::DataUnavailable {
            symbol: symbol.into(),
            reason: reason.to_string(),
        }
    }

    /// Classify a generation error for the given model
    ///
    /// Unreachable servers and missing models become `ModelUnavailable`;
    /// anything else stays a `Generation` error.
    pub fn from_generation(model: &str, err: LLMError) -> Self {
        if err.is_unavailable() {
            Self::ModelUnavailable {
                model: model.to_string(),
                reason: err.to_string(),
            }
        } else {
            Self::Generation(err)
        }
    }

    /// Remediation text shown next to the error, when there is one
    pub fn hint(&self, backend: Backend) -> Option<String> {
        match self {
            Self::ModelUnavailable { model, .. } => Some(backend.setup_hint(model)),
            Self::DataUnavailable { .. } | Self::InvalidSymbol(_) => {
                Some("Check the ticker symbol and your network connection.".to_string())
            },
            _ => None,
        }
    }

    /// Whether the error should stop the pipeline before a prompt is built
    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, Self::DataUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnalystError::InvalidSymbol("INVALID".to_string());
        assert_eq!(err.to_string(), "Invalid symbol: INVALID");

        let err = AnalystError::data_unavailable("AAPL", "No data found");
        assert_eq!(err.to_string(), "Data not available for AAPL: No data found");
        assert!(err.is_data_unavailable());
    }

    #[test]
    fn test_generation_classification() {
        let err = AnalystError::from_generation(
            "gemma3:1b",
            LLMError::ModelUnavailable {
                endpoint: "http://localhost:11434".to_string(),
                reason: "connection refused".to_string(),
            },
        );
        assert!(matches!(err, AnalystError::ModelUnavailable { ref model, .. } if model == "gemma3:1b"));

        let err = AnalystError::from_generation(
            "gemma3:1b",
            LLMError::StreamInterrupted("eof".to_string()),
        );
        assert!(matches!(err, AnalystError::Generation(_)));
    }

    #[test]
    fn test_hints() {
        let err = AnalystError::ModelUnavailable {
            model: "deepseek-r1:7b".to_string(),
            reason: "not found".to_string(),
        };
        let hint = err.hint(Backend::Ollama).unwrap();
        assert!(hint.contains("ollama serve"));
        assert!(hint.contains("ollama pull deepseek-r1:7b"));

        let hint = err.hint(Backend::OpenAICompatible).unwrap();
        assert!(hint.contains("LM Studio"));
        assert!(hint.contains("`deepseek-r1:7b` is loaded"));
        assert!(!hint.contains("ollama"));

        assert!(AnalystError::ConfigError("x".to_string()).hint(Backend::Ollama).is_none());
    }
}
