//! Normalized quote data for one fetch

use crate::api::{PricePoint, QuoteMetadata};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Sentinel shown for fields the market data service did not provide
pub const NOT_AVAILABLE: &str = "N/A";

/// A numeric field that may be missing upstream
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Metric {
    Value(f64),
    Missing,
}

impl Metric {
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::Missing => None,
        }
    }
}

impl From<Option<f64>> for Metric {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Missing, Self::Value)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.write_str(&format_number(*v)),
            Self::Missing => f.write_str(NOT_AVAILABLE),
        }
    }
}

/// Shortest decimal form of a number, always keeping one fractional digit
/// for whole values (`150.0`, `120.5`, `45.2`)
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Integer with comma thousands separators (`2,950,000,000,000`)
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Quote fields and recent closes for one ticker
///
/// Absent upstream fields are replaced by their defaults: name and currency
/// fall back to "N/A" and "USD", price and market cap to zero, and the
/// remaining metrics to [`Metric::Missing`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialSnapshot {
    pub ticker: String,
    pub name: String,
    pub price: f64,
    pub currency: String,
    pub pe_ratio: Metric,
    pub week52_high: Metric,
    pub week52_low: Metric,
    pub market_cap: u64,
    /// Every close in the lookback window, oldest first
    pub history: Vec<PricePoint>,
    /// How many trailing closes go into the prompt
    pub history_lines: usize,
}

impl FinancialSnapshot {
    /// Normalize metadata and closes into a snapshot
    pub fn from_parts(
        ticker: &str,
        meta: &QuoteMetadata,
        history: Vec<PricePoint>,
        history_lines: usize,
    ) -> Self {
        for field in [
            "longName",
            "currentPrice",
            "currency",
            "trailingPE",
            "fiftyTwoWeekHigh",
            "fiftyTwoWeekLow",
            "marketCap",
        ] {
            if !meta.contains(field) {
                debug!(ticker, field, "field missing, using default");
            }
        }

        Self {
            ticker: ticker.to_string(),
            name: meta.text("longName").unwrap_or(NOT_AVAILABLE).to_string(),
            price: meta.number("currentPrice").unwrap_or(0.0),
            currency: meta.text("currency").unwrap_or("USD").to_string(),
            pe_ratio: meta.number("trailingPE").into(),
            week52_high: meta.number("fiftyTwoWeekHigh").into(),
            week52_low: meta.number("fiftyTwoWeekLow").into(),
            market_cap: meta
                .number("marketCap")
                .filter(|v| v.is_finite() && *v > 0.0)
                .map_or(0, |v| v.round() as u64),
            history,
            history_lines,
        }
    }

    /// The last `history_lines` closes, oldest first
    pub fn recent_closes(&self) -> &[PricePoint] {
        let start = self.history.len().saturating_sub(self.history_lines);
        &self.history[start..]
    }

    /// Recent closes as `YYYY-MM-DD    <close>` lines
    pub fn history_block(&self) -> String {
        self.recent_closes()
            .iter()
            .map(|p| format!("{}    {:.2}", p.date.format("%Y-%m-%d"), p.close))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Price as shown to the user and the model
    pub fn price_display(&self) -> String {
        format_number(self.price)
    }

    /// Market cap with thousands separators
    pub fn market_cap_display(&self) -> String {
        format_thousands(self.market_cap)
    }
}
