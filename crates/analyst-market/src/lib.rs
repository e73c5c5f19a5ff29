//! Market data to streamed analysis pipeline
//!
//! This crate turns a ticker into a locally generated narrative summary:
//!
//! - Data fetching from Yahoo Finance behind the [`MarketData`] trait
//! - Normalization into a [`FinancialSnapshot`] with "N/A" / zero defaults
//! - Prompt building with model-family template selection ([`classify_model`])
//! - Streaming generation through any [`analyst_llm::GenerationProvider`]
//! - Incremental rendering onto a [`Dashboard`] after every fragment
//!
//! # Example
//!
//! ```rust,ignore
//! use analyst_market::{AnalysisPipeline, AnalysisRequest, AnalystConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AnalystConfig::from_env()?;
//!     let pipeline = AnalysisPipeline::from_config(&config)?;
//!
//!     let mut dashboard = /* your Dashboard implementation */;
//!     let report = pipeline
//!         .run(&AnalysisRequest::new("nvda", "gemma3:1b"), &mut dashboard)
//!         .await?;
//!     println!("{}", report.response);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod fetcher;
pub mod pipeline;
pub mod prompts;
pub mod render;
pub mod snapshot;

pub use api::{MarketData, PricePoint, QuoteMetadata, YahooMarketData};
pub use config::{AnalystConfig, Backend, PipelineProfile, DEFAULT_MODELS, DEFAULT_TICKER};
pub use dashboard::{Dashboard, MetricKind, MetricTile, Notice, NoticeLevel};
pub use error::{AnalystError, Result};
pub use fetcher::DataFetcher;
pub use pipeline::{AnalysisPipeline, AnalysisReport, AnalysisRequest};
pub use prompts::{classify_model, PromptBuilder, PromptRequest, PromptStyle};
pub use render::{prefixes, render, Accumulator, Rendered, TextSurface};
pub use snapshot::{FinancialSnapshot, Metric, NOT_AVAILABLE};
