//! Display seam for the dashboard

use crate::api::PricePoint;
use crate::config::Backend;
use crate::error::Result;
use crate::render::TextSurface;
use crate::snapshot::FinancialSnapshot;

/// Metric tiles the dashboard can show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    CurrentPrice,
    MarketCap,
    PeRatio,
    Week52High,
}

impl MetricKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::CurrentPrice => "Current Price",
            Self::MarketCap => "Market Cap",
            Self::PeRatio => "P/E Ratio",
            Self::Week52High => "52W High",
        }
    }

    /// Tile for this metric
    pub fn tile(self, snapshot: &FinancialSnapshot) -> MetricTile {
        let value = match self {
            Self::CurrentPrice => format!("{} {}", snapshot.price_display(), snapshot.currency),
            Self::MarketCap => snapshot.market_cap_display(),
            Self::PeRatio => snapshot.pe_ratio.to_string(),
            Self::Week52High => snapshot.week52_high.to_string(),
        };
        MetricTile {
            label: self.label(),
            value,
        }
    }
}

/// A labelled value shown side by side with the others
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricTile {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A banner message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// Reminder that the selected model must be pulled locally
    pub fn tip(backend: Backend, model: &str) -> Self {
        Self::info(match backend {
            Backend::Ollama => format!(
                "Tip: Ensure Ollama is running and you have run `ollama pull {model}` in your terminal."
            ),
            Backend::OpenAICompatible => {
                format!("Tip: Ensure your OpenAI-compatible server is running with `{model}` loaded.")
            },
        })
    }

    /// Shown before the first analysis is requested
    pub fn idle() -> Self {
        Self::info("Enter a stock ticker and press Enter to generate an analysis.")
    }
}

/// Everything the pipeline draws on
///
/// The streaming text area is the [`TextSurface`] supertrait.
pub trait Dashboard: TextSurface + Send {
    fn header(&mut self, title: &str) -> Result<()>;

    fn subheader(&mut self, title: &str) -> Result<()>;

    fn metrics(&mut self, tiles: &[MetricTile]) -> Result<()>;

    /// Line chart of closing prices, oldest first
    fn line_chart(&mut self, series: &[PricePoint]) -> Result<()>;

    fn notify(&mut self, notice: &Notice) -> Result<()>;

    /// Transient status line shown while waiting on the model
    fn status(&mut self, message: &str) -> Result<()>;
}
