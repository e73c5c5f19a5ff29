//! Error types for prompt operations

use thiserror::Error;

/// Result type for prompt operations
pub type Result<T> = std::result::Result<T, PromptError>;

/// Errors that can occur while building or rendering prompts
#[derive(Error, Debug)]
pub enum PromptError {
    /// Template source failed to parse
    #[error("Failed to parse template '{name}': {detail}")]
    TemplateParseFailed { name: String, detail: String },

    /// Template rendering failed, including references to undefined variables
    #[error("Failed to render template '{name}': {detail}")]
    RenderError { name: String, detail: String },

    /// Template not registered in registry
    #[error("Template '{0}' not registered")]
    TemplateNotRegistered(String),

    /// Template source was empty
    #[error("Template '{0}' has no content")]
    EmptyTemplate(String),

    /// Variables could not be serialized into a template context
    #[error("Failed to serialize variables: {0}")]
    SerializationError(String),
}

impl PromptError {
    /// Name of the template involved, when the error concerns one
    pub fn template_name(&self) -> Option<&str> {
        match self {
            Self::TemplateParseFailed { name, .. } | Self::RenderError { name, .. } => Some(name),
            Self::TemplateNotRegistered(name) | Self::EmptyTemplate(name) => Some(name),
            Self::SerializationError(_) => None,
        }
    }
}
