//! Analysis prompt templates
//!
//! Variables: `ticker`, `name`, `price`, `currency`, `pe_ratio`,
//! `week52_low`, `week52_high`, `market_cap`, `history`, `history_days`.

use super::PromptStyle;
use analyst_prompt::{JinjaTemplate, Result};

const SUMMARY: &str = "\
You are a professional financial editor. Summarize the following data for {{ ticker }} ({{ name }}).

KEY METRICS:
- Price: {{ price }} {{ currency }}
- P/E Ratio: {{ pe_ratio }}
- 52W Range: {{ week52_low }} - {{ week52_high }}

RECENT PRICE HISTORY (Last {{ history_days }} Days):
{{ history }}

TASK:
Provide a high-level Executive Summary using 'Bullet-Point' format.
Address:
1. Price Momentum: (Is it trending up or down based on history?)
2. Valuation: (Is the P/E ratio attractive for this sector?)
3. Outlook: (Neutral, Bullish, or Bearish?)
Keep it professional, data-driven, and extremely concise.";

const REASONING: &str = "\
You are a senior equity researcher. Perform a deep-dive analysis on {{ ticker }} ({{ name }}).

DATA:
- Name: {{ name }}
- Price: {{ price }}
- Currency: {{ currency }}
- Market Cap: {{ market_cap }}
- P/E Ratio: {{ pe_ratio }}
- 52W High: {{ week52_high }}
- 52W Low: {{ week52_low }}
- Recent Closes (Last {{ history_days }} Days):
{{ history }}

TASK:
1. Analyze the current price relative to the 52-week high/low.
2. Evaluate the volatility based on recent price history.
3. Identify potential risks or opportunities for investors.
Provide a detailed reasoning-based response.";

/// Bullet-point executive summary template
pub fn summary_prompt() -> Result<JinjaTemplate> {
    JinjaTemplate::new(PromptStyle::Summary.template_name(), SUMMARY)
}

/// Deep-dive research template
pub fn reasoning_prompt() -> Result<JinjaTemplate> {
    JinjaTemplate::new(PromptStyle::Reasoning.template_name(), REASONING)
}
