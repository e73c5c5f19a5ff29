//! Yahoo Finance market data client
//!
//! Closing prices come from the `yahoo_finance_api` chart endpoint. Quote
//! fields come from the `quoteSummary` endpoint, which needs a session
//! cookie and crumb; when that fails the chart metadata is used instead,
//! which lacks P/E and market cap.

use super::{lookback_days, MarketData, PricePoint, QuoteMetadata};
use crate::error::{AnalystError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde_json::{Map, Value};
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{debug, instrument, warn};
use yahoo_finance_api as yahoo;

const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
/// quoteSummary modules, highest precedence first
const SUMMARY_MODULES: [&str; 3] = ["price", "summaryDetail", "financialData"];
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Yahoo Finance implementation of [`MarketData`]
#[derive(Debug, Clone)]
pub struct YahooMarketData {
    client: Client,
    request_timeout: Duration,
}

impl YahooMarketData {
    /// Create a client whose requests time out after `request_timeout`
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .timeout(request_timeout)
            .build()?;

        Ok(Self { client, request_timeout })
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    fn connector(&self) -> Result<yahoo::YahooConnector> {
        yahoo::YahooConnector::builder()
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| AnalystError::YahooFinanceError(e.to_string()))
    }

    async fn crumb(&self) -> Result<String> {
        // fc.yahoo.com answers 404 but sets the session cookie
        if let Err(e) = self.client.get(COOKIE_URL).send().await {
            debug!(error = %e, "cookie request failed");
        }

        let crumb = self
            .client
            .get(CRUMB_URL)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let crumb = crumb.trim();
        if crumb.is_empty() || crumb.contains('<') || crumb.contains(' ') {
            return Err(AnalystError::YahooFinanceError(
                "could not obtain a crumb".to_string(),
            ));
        }
        Ok(crumb.to_string())
    }

    #[instrument(skip(self))]
    async fn quote_summary(&self, ticker: &str) -> Result<QuoteMetadata> {
        let crumb = self.crumb().await?;
        let modules = SUMMARY_MODULES.join(",");

        let body: Value = self
            .client
            .get(format!("{QUOTE_SUMMARY_URL}/{ticker}"))
            .query(&[("modules", modules.as_str()), ("crumb", crumb.as_str())])
            .send()
            .await?
            .json()
            .await?;

        flatten_quote_summary(&body)
    }

    #[instrument(skip(self))]
    async fn chart_meta(&self, ticker: &str) -> Result<QuoteMetadata> {
        let body: Value = self
            .client
            .get(format!("{CHART_URL}/{ticker}"))
            .query(&[("range", "1d"), ("interval", "1d")])
            .send()
            .await?
            .json()
            .await?;

        flatten_chart_meta(&body)
    }
}

#[async_trait]
impl MarketData for YahooMarketData {
    async fn quote_metadata(&self, ticker: &str) -> Result<QuoteMetadata> {
        match self.quote_summary(ticker).await {
            Ok(meta) if !meta.is_empty() => Ok(meta),
            Ok(_) => {
                debug!(ticker, "quoteSummary returned no fields, using chart metadata");
                self.chart_meta(ticker).await
            },
            Err(e) => {
                warn!(ticker, error = %e, "quoteSummary failed, using chart metadata");
                self.chart_meta(ticker).await
            },
        }
    }

    #[instrument(skip(self))]
    async fn historical_closes(&self, ticker: &str, lookback: &str) -> Result<Vec<PricePoint>> {
        let days = lookback_days(lookback).ok_or_else(|| {
            AnalystError::ConfigError(format!("Invalid range: {lookback}"))
        })?;

        let end = Utc::now();
        let start = end - ChronoDuration::days(days);

        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| AnalystError::YahooFinanceError(format!("Invalid start timestamp: {e}")))?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| AnalystError::YahooFinanceError(format!("Invalid end timestamp: {e}")))?;

        let response = self
            .connector()?
            .get_quote_history(ticker, start_odt, end_odt)
            .await
            .map_err(|e| AnalystError::YahooFinanceError(e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| AnalystError::YahooFinanceError(e.to_string()))?;

        let points: Vec<PricePoint> = quotes
            .iter()
            .filter_map(|q| {
                let date = DateTime::from_timestamp(q.timestamp as i64, 0)?.date_naive();
                Some(PricePoint::new(date, q.close))
            })
            .collect();

        debug!(ticker, count = points.len(), "fetched closes");
        Ok(points)
    }
}

/// Merge the modules of a `quoteSummary` response into one field map
///
/// A field found in several modules is taken from the first one in
/// `SUMMARY_MODULES`, then from any other module in name order. Empty `{}`
/// placeholders are skipped.
pub fn flatten_quote_summary(body: &Value) -> Result<QuoteMetadata> {
    let summary = &body["quoteSummary"];
    if let Some(description) = summary["error"]["description"].as_str() {
        return Err(AnalystError::YahooFinanceError(description.to_string()));
    }

    let modules = summary["result"][0].as_object().ok_or_else(|| {
        AnalystError::YahooFinanceError("quoteSummary response has no result".to_string())
    })?;

    let known = SUMMARY_MODULES.iter().filter_map(|name| modules.get(*name));
    let others = modules
        .iter()
        .filter(|(name, _)| !SUMMARY_MODULES.contains(&name.as_str()))
        .map(|(_, module)| module);

    let mut fields = Map::new();
    for module in known.chain(others).filter_map(Value::as_object) {
        for (key, value) in module {
            if is_blank(value) || fields.contains_key(key) {
                continue;
            }
            fields.insert(key.clone(), value.clone());
        }
    }

    Ok(QuoteMetadata::new(fields))
}

/// Map the `meta` block of a chart response onto quote field names
pub fn flatten_chart_meta(body: &Value) -> Result<QuoteMetadata> {
    let chart = &body["chart"];
    if let Some(description) = chart["error"]["description"].as_str() {
        return Err(AnalystError::YahooFinanceError(description.to_string()));
    }

    let meta = chart["result"][0]["meta"].as_object().ok_or_else(|| {
        AnalystError::YahooFinanceError("chart response has no metadata".to_string())
    })?;

    let mut out = QuoteMetadata::default();
    for (from, to) in [
        ("longName", "longName"),
        ("currency", "currency"),
        ("regularMarketPrice", "currentPrice"),
        ("fiftyTwoWeekHigh", "fiftyTwoWeekHigh"),
        ("fiftyTwoWeekLow", "fiftyTwoWeekLow"),
    ] {
        if let Some(value) = meta.get(from).filter(|v| !is_blank(v)) {
            out.insert(to, value.clone());
        }
    }
    Ok(out)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn summary_fixture() -> Value {
        json!({
            "quoteSummary": {
                "result": [{
                    "price": {
                        "longName": "NVIDIA Corporation",
                        "currency": "USD",
                        "marketCap": { "raw": 2_950_000_000_000_i64, "fmt": "2.95T" },
                        "regularMarketPrice": { "raw": 120.5, "fmt": "120.50" }
                    },
                    "summaryDetail": {
                        "trailingPE": { "raw": 45.2, "fmt": "45.20" },
                        "fiftyTwoWeekHigh": { "raw": 150.0, "fmt": "150.00" },
                        "fiftyTwoWeekLow": { "raw": 80.0, "fmt": "80.00" },
                        "marketCap": { "raw": 1, "fmt": "1" },
                        "forwardPE": {}
                    },
                    "financialData": {
                        "currentPrice": { "raw": 120.5, "fmt": "120.50" }
                    }
                }],
                "error": null
            }
        })
    }

    #[test]
    fn test_flatten_quote_summary() {
        let meta = flatten_quote_summary(&summary_fixture()).unwrap();

        assert_eq!(meta.text("longName"), Some("NVIDIA Corporation"));
        assert_eq!(meta.text("currency"), Some("USD"));
        assert_eq!(meta.number("currentPrice"), Some(120.5));
        assert_eq!(meta.number("trailingPE"), Some(45.2));
        assert_eq!(meta.number("fiftyTwoWeekHigh"), Some(150.0));
        assert_eq!(meta.number("fiftyTwoWeekLow"), Some(80.0));
        assert!(!meta.contains("forwardPE"));
    }

    #[test]
    fn test_flatten_quote_summary_module_precedence() {
        // financialData sorts first by name but ranks below summaryDetail
        let body = json!({
            "quoteSummary": {
                "result": [{
                    "financialData": {
                        "trailingPE": { "raw": 99.0 },
                        "currency": "EUR",
                        "targetMeanPrice": { "raw": 140.0 }
                    },
                    "summaryDetail": {
                        "trailingPE": { "raw": 45.2 },
                        "currency": "GBP"
                    },
                    "price": { "currency": "USD" }
                }],
                "error": null
            }
        });

        let meta = flatten_quote_summary(&body).unwrap();
        assert_eq!(meta.text("currency"), Some("USD"));
        assert_eq!(meta.number("trailingPE"), Some(45.2));
        assert_eq!(meta.number("targetMeanPrice"), Some(140.0));
    }

    #[test]
    fn test_flatten_quote_summary_error() {
        let body = json!({
            "quoteSummary": {
                "result": null,
                "error": { "code": "Not Found", "description": "Quote not found for symbol: ZZZZ" }
            }
        });

        let err = flatten_quote_summary(&body).unwrap_err();
        assert!(err.to_string().contains("Quote not found"));
    }

    #[test]
    fn test_flatten_chart_meta() {
        let body = json!({
            "chart": {
                "result": [{
                    "meta": {
                        "currency": "USD",
                        "symbol": "NVDA",
                        "longName": "NVIDIA Corporation",
                        "regularMarketPrice": 120.5,
                        "fiftyTwoWeekHigh": 150.0,
                        "fiftyTwoWeekLow": 80.0
                    }
                }],
                "error": null
            }
        });

        let meta = flatten_chart_meta(&body).unwrap();
        assert_eq!(meta.number("currentPrice"), Some(120.5));
        assert_eq!(meta.number("fiftyTwoWeekLow"), Some(80.0));
        assert_eq!(meta.number("trailingPE"), None);
        assert_eq!(meta.number("marketCap"), None);
    }

    #[test]
    fn test_flatten_chart_meta_missing_result() {
        let body = json!({ "chart": { "result": [], "error": null } });
        assert!(flatten_chart_meta(&body).is_err());
    }

    #[test]
    fn test_history_connector_uses_request_timeout() {
        let client = YahooMarketData::new(Duration::from_secs(7)).unwrap();
        assert_eq!(client.request_timeout(), Duration::from_secs(7));
        assert!(client.connector().is_ok());
    }

    #[tokio::test]
    async fn test_invalid_lookback() {
        let client = YahooMarketData::new(Duration::from_secs(5)).unwrap();
        let result = client.historical_closes("NVDA", "7w").await;
        assert!(matches!(result, Err(AnalystError::ConfigError(_))));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_live_history() {
        let client = YahooMarketData::new(Duration::from_secs(30)).unwrap();
        let closes = client.historical_closes("AAPL", "1mo").await.unwrap();
        assert!(!closes.is_empty());
        assert!(closes.windows(2).all(|w| w[0].date <= w[1].date));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_live_metadata() {
        let client = YahooMarketData::new(Duration::from_secs(30)).unwrap();
        let meta = client.quote_metadata("AAPL").await.unwrap();
        assert!(meta.number("currentPrice").is_some());
    }
}
