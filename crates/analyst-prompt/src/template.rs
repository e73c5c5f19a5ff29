//! Core prompt template trait

use crate::Result;

/// Core trait for prompt templates
///
/// Variables are passed as `serde_json::Value` so the trait stays dyn-compatible
/// and templates can live behind `Arc<dyn PromptTemplate>` in a registry.
pub trait PromptTemplate: Send + Sync {
    /// Get the template name/identifier
    fn name(&self) -> &str;

    /// Render the template with variables
    ///
    /// Every variable the template references must be present in `vars`.
    fn render(&self, vars: &serde_json::Value) -> Result<String>;

    /// Get the raw template source (for debugging/inspection)
    fn raw_template(&self) -> &str;

    /// Render from any serializable context
    fn render_serialize<T: serde::Serialize>(&self, vars: &T) -> Result<String>
    where
        Self: Sized,
    {
        let value = serde_json::to_value(vars)
            .map_err(|e| crate::PromptError::SerializationError(e.to_string()))?;
        self.render(&value)
    }
}
