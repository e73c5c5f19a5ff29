//! Data fetcher: ticker in, normalized snapshot out

use crate::api::MarketData;
use crate::error::{AnalystError, Result};
use crate::snapshot::FinancialSnapshot;
use std::sync::Arc;
use tracing::{info, instrument};

/// Fetches quote metadata and recent closes for a ticker
///
/// One metadata request and one history request per call; no caching and
/// no retry. Any upstream failure or an empty history is reported as
/// [`AnalystError::DataUnavailable`].
#[derive(Clone)]
pub struct DataFetcher {
    source: Arc<dyn MarketData>,
    lookback: String,
    history_lines: usize,
}

impl DataFetcher {
    pub fn new(source: Arc<dyn MarketData>, lookback: impl Into<String>, history_lines: usize) -> Self {
        Self {
            source,
            lookback: lookback.into(),
            history_lines,
        }
    }

    pub fn history_lines(&self) -> usize {
        self.history_lines
    }

    /// Fetch a snapshot for an uppercased ticker
    #[instrument(skip(self), fields(lookback = %self.lookback))]
    pub async fn fetch(&self, ticker: &str) -> Result<FinancialSnapshot> {
        if ticker.trim().is_empty() {
            return Err(AnalystError::InvalidSymbol(ticker.to_string()));
        }

        let (meta, history) = tokio::join!(
            self.source.quote_metadata(ticker),
            self.source.historical_closes(ticker, &self.lookback),
        );

        let history = history.map_err(|e| AnalystError::data_unavailable(ticker, e))?;
        if history.is_empty() {
            return Err(AnalystError::data_unavailable(ticker, "No data found for this ticker."));
        }
        let meta = meta.map_err(|e| AnalystError::data_unavailable(ticker, e))?;

        info!(ticker, closes = history.len(), "fetched market data");
        Ok(FinancialSnapshot::from_parts(ticker, &meta, history, self.history_lines))
    }
}

impl std::fmt::Debug for DataFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataFetcher")
            .field("lookback", &self.lookback)
            .field("history_lines", &self.history_lines)
            .finish_non_exhaustive()
    }
}
