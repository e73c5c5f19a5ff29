//! Prompt builder
//!
//! Turns a [`FinancialSnapshot`] into the instruction string for one model.
//! The template is chosen by [`classify_model`]; missing values are inserted
//! as "N/A" and left for the model to handle.

mod style;
mod templates;

pub use style::{classify_model, PromptStyle};
pub use templates::{reasoning_prompt, summary_prompt};

use crate::error::Result;
use crate::snapshot::FinancialSnapshot;
use analyst_prompt::PromptRegistry;
use serde::Serialize;
use std::sync::Arc;

/// Register the analysis templates with the given registry
pub fn register_prompts(registry: &PromptRegistry) -> analyst_prompt::Result<()> {
    registry.register(summary_prompt()?);
    registry.register(reasoning_prompt()?);
    Ok(())
}

/// The rendered instruction for one generation session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptRequest {
    pub model_id: String,
    pub style: PromptStyle,
    pub rendered_text: String,
}

/// Template variables, already formatted for display
#[derive(Debug, Serialize)]
struct PromptVars<'a> {
    ticker: &'a str,
    name: &'a str,
    price: String,
    currency: &'a str,
    pe_ratio: String,
    week52_low: String,
    week52_high: String,
    market_cap: String,
    history: String,
    history_days: usize,
}

impl<'a> PromptVars<'a> {
    fn new(snapshot: &'a FinancialSnapshot, ticker: &'a str) -> Self {
        Self {
            ticker,
            name: &snapshot.name,
            price: snapshot.price_display(),
            currency: &snapshot.currency,
            pe_ratio: snapshot.pe_ratio.to_string(),
            week52_low: snapshot.week52_low.to_string(),
            week52_high: snapshot.week52_high.to_string(),
            market_cap: snapshot.market_cap.to_string(),
            history: snapshot.history_block(),
            history_days: snapshot.recent_closes().len(),
        }
    }
}

/// Renders analysis prompts from a shared registry
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    registry: Arc<PromptRegistry>,
}

impl PromptBuilder {
    /// Builder with its own registry holding the analysis templates
    pub fn new() -> Result<Self> {
        Self::with_registry(Arc::new(PromptRegistry::new()))
    }

    /// Register the analysis templates into `registry` and build from it
    pub fn with_registry(registry: Arc<PromptRegistry>) -> Result<Self> {
        register_prompts(&registry)?;
        Ok(Self { registry })
    }

    pub fn registry(&self) -> &Arc<PromptRegistry> {
        &self.registry
    }

    /// Render the prompt for `model_id`
    ///
    /// Same inputs always give the same text.
    pub fn build(&self, snapshot: &FinancialSnapshot, ticker: &str, model_id: &str) -> Result<PromptRequest> {
        let style = classify_model(model_id);
        let vars = serde_json::to_value(PromptVars::new(snapshot, ticker))?;
        let rendered_text = self.registry.render(style.template_name(), &vars)?;

        Ok(PromptRequest {
            model_id: model_id.to_string(),
            style,
            rendered_text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{PricePoint, QuoteMetadata};
    use chrono::NaiveDate;
    use serde_json::json;

    fn nvda(history_lines: usize) -> FinancialSnapshot {
        let meta = QuoteMetadata::from_value(json!({
            "longName": "NVIDIA Corporation",
            "currentPrice": 120.5,
            "trailingPE": 45.2,
            "fiftyTwoWeekHigh": 150.0,
            "fiftyTwoWeekLow": 80.0,
            "currency": "USD"
        }));
        let history = (1..=15)
            .map(|d| PricePoint::new(NaiveDate::from_ymd_opt(2024, 7, d).unwrap(), 110.0 + f64::from(d)))
            .collect();
        FinancialSnapshot::from_parts("NVDA", &meta, history, history_lines)
    }

    #[test]
    fn test_register_prompts() {
        let registry = PromptRegistry::new();
        register_prompts(&registry).unwrap();

        assert!(registry.contains("analyst.summary"));
        assert!(registry.contains("analyst.reasoning"));
    }

    #[test]
    fn test_summary_prompt_for_gemma() {
        let builder = PromptBuilder::new().unwrap();
        let request = builder.build(&nvda(10), "NVDA", "gemma3:1b").unwrap();

        assert_eq!(request.style, PromptStyle::Summary);
        assert_eq!(request.model_id, "gemma3:1b");
        let text = &request.rendered_text;
        assert!(text.starts_with("You are a professional financial editor."));
        assert!(text.contains("NVDA (NVIDIA Corporation)"));
        assert!(text.contains("- Price: 120.5 USD"));
        assert!(text.contains("- P/E Ratio: 45.2"));
        assert!(text.contains("- 52W Range: 80.0 - 150.0"));
        assert!(text.contains("RECENT PRICE HISTORY (Last 10 Days):\n2024-07-06    116.00\n"));
        assert!(text.contains("2024-07-15    125.00\n\nTASK:"));
    }

    #[test]
    fn test_reasoning_prompt_lists_every_field() {
        let builder = PromptBuilder::new().unwrap();
        let request = builder.build(&nvda(5), "NVDA", "deepseek-r1:7b").unwrap();

        assert_eq!(request.style, PromptStyle::Reasoning);
        let text = &request.rendered_text;
        assert!(text.starts_with("You are a senior equity researcher."));
        for line in [
            "- Name: NVIDIA Corporation",
            "- Price: 120.5",
            "- Currency: USD",
            "- Market Cap: 0",
            "- P/E Ratio: 45.2",
            "- 52W High: 150.0",
            "- 52W Low: 80.0",
            "- Recent Closes (Last 5 Days):",
        ] {
            assert!(text.contains(line), "missing {line:?}");
        }
        assert_eq!(text.matches("2024-07-").count(), 5);
    }

    #[test]
    fn test_sentinels_inserted_verbatim() {
        let snapshot = FinancialSnapshot::from_parts(
            "XYZ",
            &QuoteMetadata::default(),
            vec![PricePoint::new(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 9.5)],
            10,
        );
        let builder = PromptBuilder::new().unwrap();

        for model in ["gemma3:1b", "llama3.1"] {
            let text = builder.build(&snapshot, "XYZ", model).unwrap().rendered_text;
            assert!(text.contains("XYZ (N/A)"));
            assert!(text.contains("P/E Ratio: N/A"));
            assert!(text.contains("2024-01-02    9.50"));
            assert!(!text.contains("{{"));
        }
    }

    #[test]
    fn test_build_is_deterministic() {
        let builder = PromptBuilder::new().unwrap();
        let snapshot = nvda(10);
        let a = builder.build(&snapshot, "NVDA", "llama3.1").unwrap();
        let b = builder.build(&snapshot, "NVDA", "llama3.1").unwrap();
        assert_eq!(a, b);
    }
}
