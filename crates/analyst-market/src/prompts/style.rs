//! Template selection by model family

use serde::Serialize;
use std::fmt;

/// Prompt shape sent to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PromptStyle {
    /// Bullet-point executive summary, for small summarization models
    Summary,
    /// Open-ended deep dive, for reasoning models
    Reasoning,
}

impl PromptStyle {
    /// Registry name of the template for this style
    pub fn template_name(self) -> &'static str {
        match self {
            Self::Summary => "analyst.summary",
            Self::Reasoning => "analyst.reasoning",
        }
    }
}

impl fmt::Display for PromptStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Summary => write!(f, "summary"),
            Self::Reasoning => write!(f, "reasoning"),
        }
    }
}

/// Model id substrings (lowercase) and the style they select; first match wins
const STYLE_RULES: &[(&str, PromptStyle)] = &[("gemma", PromptStyle::Summary)];

/// Pick the prompt style for a model id; unmatched ids get [`PromptStyle::Reasoning`]
pub fn classify_model(model_id: &str) -> PromptStyle {
    let id = model_id.to_lowercase();
    STYLE_RULES
        .iter()
        .find(|(needle, _)| id.contains(needle))
        .map_or(PromptStyle::Reasoning, |(_, style)| *style)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_models() {
        assert_eq!(classify_model("gemma3:1b"), PromptStyle::Summary);
        assert_eq!(classify_model("deepseek-r1:7b"), PromptStyle::Reasoning);
        assert_eq!(classify_model("deepseek-r1:1.5b"), PromptStyle::Reasoning);
        assert_eq!(classify_model("llama3.1"), PromptStyle::Reasoning);
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(classify_model("Gemma2:9B"), PromptStyle::Summary);
        assert_eq!(classify_model("codegemma"), PromptStyle::Summary);
        assert_eq!(classify_model(""), PromptStyle::Reasoning);
    }

    #[test]
    fn test_template_names() {
        assert_eq!(PromptStyle::Summary.template_name(), "analyst.summary");
        assert_eq!(PromptStyle::Reasoning.to_string(), "reasoning");
    }
}
