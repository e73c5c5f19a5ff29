//! Market data seam and its Yahoo Finance implementation

pub mod yahoo;

pub use yahoo::YahooMarketData;

use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Named quote fields as returned by the market data service
///
/// Values may be absent. Numbers are accepted either bare or in Yahoo's
/// `{"raw": n, "fmt": "..."}` wrapper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteMetadata {
    fields: Map<String, Value>,
}

impl QuoteMetadata {
    /// Wrap a field map
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Build from a JSON object; anything else yields empty metadata
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields },
            _ => Self::default(),
        }
    }

    /// Set a field
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    /// Numeric field, if present and numeric
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.fields.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::Object(wrapped) => wrapped.get("raw").and_then(Value::as_f64),
            _ => None,
        }
    }

    /// Text field, if present, a string and not blank
    pub fn text(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Whether a field is present with a usable value
    pub fn contains(&self, key: &str) -> bool {
        self.number(key).is_some() || self.text(key).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One closing price in the historical series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Number of calendar days covered by a Yahoo range string
pub fn lookback_days(range: &str) -> Option<i64> {
    match range {
        "1d" => Some(1),
        "5d" => Some(5),
        "1mo" => Some(30),
        "3mo" => Some(90),
        "6mo" => Some(180),
        "1y" => Some(365),
        _ => None,
    }
}

/// Source of quote metadata and closing prices
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Current quote fields for a ticker
    async fn quote_metadata(&self, ticker: &str) -> Result<QuoteMetadata>;

    /// Daily closes for a ticker over `lookback` (e.g. "1mo"), oldest first; may be empty
    async fn historical_closes(&self, ticker: &str, lookback: &str) -> Result<Vec<PricePoint>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_accepts_bare_and_wrapped() {
        let meta = QuoteMetadata::from_value(json!({
            "currentPrice": 120.5,
            "trailingPE": { "raw": 45.2, "fmt": "45.20" },
            "marketCap": {},
            "currency": "USD"
        }));

        assert_eq!(meta.number("currentPrice"), Some(120.5));
        assert_eq!(meta.number("trailingPE"), Some(45.2));
        assert_eq!(meta.number("marketCap"), None);
        assert_eq!(meta.number("currency"), None);
        assert_eq!(meta.number("missing"), None);
    }

    #[test]
    fn test_text() {
        let meta = QuoteMetadata::from_value(json!({
            "longName": "NVIDIA Corporation",
            "shortName": "  ",
            "currentPrice": 1.0
        }));

        assert_eq!(meta.text("longName"), Some("NVIDIA Corporation"));
        assert_eq!(meta.text("shortName"), None);
        assert_eq!(meta.text("currentPrice"), None);
        assert!(meta.contains("currentPrice"));
        assert!(!meta.contains("shortName"));
    }

    #[test]
    fn test_from_non_object() {
        assert!(QuoteMetadata::from_value(json!([1, 2])).is_empty());
    }

    #[test]
    fn test_lookback_days() {
        assert_eq!(lookback_days("1mo"), Some(30));
        assert_eq!(lookback_days("1y"), Some(365));
        assert_eq!(lookback_days("forever"), None);
    }
}
