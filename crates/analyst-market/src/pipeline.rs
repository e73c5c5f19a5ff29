//! The analysis pipeline: fetch, build prompt, stream, render
//!
//! Each [`AnalysisPipeline::run`] is independent; the pipeline itself holds
//! only immutable configuration and shared clients.

use crate::api::{MarketData, YahooMarketData};
use crate::config::{AnalystConfig, Backend, PipelineProfile};
use crate::dashboard::{Dashboard, MetricTile, Notice};
use crate::error::{AnalystError, Result};
use crate::fetcher::DataFetcher;
use crate::prompts::{PromptBuilder, PromptRequest};
use crate::render::render;
use crate::snapshot::FinancialSnapshot;
use analyst_llm::providers::{OllamaConfig, OllamaProvider, OpenAIConfig, OpenAIProvider};
use analyst_llm::{GenerationProvider, GenerationRequest, TracedProvider};
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// One user-initiated trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub ticker: String,
    pub model: String,
}

impl AnalysisRequest {
    /// Request for `ticker` (trimmed and uppercased) with `model`
    pub fn new(ticker: &str, model: impl Into<String>) -> Self {
        Self {
            ticker: ticker.trim().to_uppercase(),
            model: model.into(),
        }
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub snapshot: FinancialSnapshot,
    pub prompt: PromptRequest,
    pub response: String,
    pub fragments: usize,
}

/// Fetcher, prompt builder and generator wired together
pub struct AnalysisPipeline {
    fetcher: DataFetcher,
    provider: Arc<dyn GenerationProvider>,
    prompts: PromptBuilder,
    profile: PipelineProfile,
    backend: Backend,
    chart_title: String,
}

impl AnalysisPipeline {
    pub fn new(
        market: Arc<dyn MarketData>,
        provider: Arc<dyn GenerationProvider>,
        profile: PipelineProfile,
    ) -> Result<Self> {
        Ok(Self {
            fetcher: DataFetcher::new(market, "1mo", profile.history_lines()),
            provider,
            prompts: PromptBuilder::new()?,
            profile,
            backend: Backend::default(),
            chart_title: AnalystConfig::default().chart_title(),
        })
    }

    /// Name `backend` in error banners and hints
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Pipeline backed by Yahoo Finance and the configured local backend
    pub fn from_config(config: &AnalystConfig) -> Result<Self> {
        config.validate()?;

        let market: Arc<dyn MarketData> = Arc::new(YahooMarketData::new(config.request_timeout)?);
        let provider = provider_for(config)?;

        Ok(Self {
            fetcher: DataFetcher::new(market, config.lookback.clone(), config.profile.history_lines()),
            provider,
            prompts: PromptBuilder::new()?,
            profile: config.profile,
            backend: config.backend,
            chart_title: config.chart_title(),
        })
    }

    pub fn profile(&self) -> PipelineProfile {
        self.profile
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn provider(&self) -> &Arc<dyn GenerationProvider> {
        &self.provider
    }

    /// Run one analysis, drawing on `dashboard` as results arrive
    ///
    /// Failures are shown as banners on the dashboard and also returned.
    pub async fn run(&self, request: &AnalysisRequest, dashboard: &mut dyn Dashboard) -> Result<AnalysisReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!(
            "analysis",
            %run_id,
            ticker = %request.ticker,
            model = %request.model,
            profile = %self.profile,
        );

        async {
            let result = self.run_inner(run_id, request, dashboard).await;
            match &result {
                Ok(report) => info!(fragments = report.fragments, chars = report.response.len(), "analysis complete"),
                Err(e) => {
                    warn!(error = %e, "analysis failed");
                    surface_error(dashboard, e, self.backend);
                },
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_inner(
        &self,
        run_id: Uuid,
        request: &AnalysisRequest,
        dashboard: &mut dyn Dashboard,
    ) -> Result<AnalysisReport> {
        let ticker = request.ticker.as_str();
        let model = request.model.as_str();

        let snapshot = self.fetcher.fetch(ticker).await?;

        dashboard.header(&format!("Financial Overview: {} ({ticker})", snapshot.name))?;
        let tiles: Vec<MetricTile> = self.profile.tiles().iter().map(|kind| kind.tile(&snapshot)).collect();
        dashboard.metrics(&tiles)?;
        dashboard.subheader(&self.chart_title)?;
        dashboard.line_chart(&snapshot.history)?;

        dashboard.subheader(&format!("AI Analysis ({model})"))?;
        let prompt = self.prompts.build(&snapshot, ticker, model)?;
        info!(style = %prompt.style, chars = prompt.rendered_text.len(), "prompt built");

        dashboard.status(&format!("Requesting analysis from {model}..."))?;
        let provider: Arc<dyn GenerationProvider> = if self.profile.traced() {
            Arc::new(TracedProvider::new(Arc::clone(&self.provider)))
        } else {
            Arc::clone(&self.provider)
        };

        let generation = GenerationRequest::new(model, prompt.rendered_text.clone());
        let stream = provider
            .open_stream(generation)
            .await
            .map_err(|e| AnalystError::from_generation(model, e))?;

        let rendered = render(stream, dashboard).await.map_err(|failure| match failure.error {
            AnalystError::Generation(e) => AnalystError::from_generation(model, e),
            other => other,
        })?;

        Ok(AnalysisReport {
            run_id,
            snapshot,
            prompt,
            response: rendered.text,
            fragments: rendered.fragments,
        })
    }
}

impl std::fmt::Debug for AnalysisPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisPipeline")
            .field("fetcher", &self.fetcher)
            .field("provider", &self.provider.name())
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

/// Build the generation provider for the configured backend
pub fn provider_for(config: &AnalystConfig) -> Result<Arc<dyn GenerationProvider>> {
    let base_url = config.effective_base_url();
    let connect_secs = config.connect_timeout.as_secs();

    let provider: Arc<dyn GenerationProvider> = match config.backend {
        Backend::Ollama => Arc::new(OllamaProvider::with_config(
            OllamaConfig::new(base_url).with_connect_timeout(connect_secs),
        )?),
        Backend::OpenAICompatible => {
            let key = config.api_key.clone().unwrap_or_else(|| "not-needed".to_string());
            Arc::new(OpenAIProvider::with_config(
                OpenAIConfig::new(key)
                    .with_api_base(base_url)
                    .with_connect_timeout(connect_secs),
            )?)
        },
    };
    Ok(provider)
}

/// Show an error banner, plus a warning with the remediation hint if any
fn surface_error(dashboard: &mut dyn Dashboard, error: &AnalystError, backend: Backend) {
    let message = match error {
        AnalystError::DataUnavailable { reason, .. } => format!("Error fetching data: {reason}"),
        AnalystError::ModelUnavailable { reason, .. } => {
            format!("{} Connection Error: {reason}", backend.server_name())
        },
        other => other.to_string(),
    };

    let mut notices = vec![Notice::error(message)];
    if let Some(hint) = error.hint(backend) {
        notices.push(Notice::warning(hint));
    }

    for notice in &notices {
        if let Err(e) = dashboard.notify(notice) {
            warn!(error = %e, "could not show notice");
        }
    }
}
