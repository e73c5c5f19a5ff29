//! Configuration for the analysis pipeline

use crate::api::lookback_days;
use crate::dashboard::MetricKind;
use crate::error::{AnalystError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Models offered by the selector, in display order
pub const DEFAULT_MODELS: [&str; 4] = ["gemma3:1b", "deepseek-r1:7b", "deepseek-r1:1.5b", "llama3.1"];

/// Ticker analysed when the user has not typed one
pub const DEFAULT_TICKER: &str = "NVDA";

/// Generation backend serving the local model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Ollama native API (default)
    #[default]
    Ollama,
    /// Any server exposing an OpenAI-compatible `/chat/completions` endpoint
    OpenAICompatible,
}

impl Backend {
    /// Base URL used when none is configured
    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::Ollama => "http://localhost:11434",
            Self::OpenAICompatible => "http://localhost:1234/v1",
        }
    }

    /// How the server is named in banners
    pub fn server_name(self) -> &'static str {
        match self {
            Self::Ollama => "Ollama",
            Self::OpenAICompatible => "OpenAI-compatible server",
        }
    }

    /// What to check when `model` cannot be served
    pub fn setup_hint(self, model: &str) -> String {
        match self {
            Self::Ollama => format!(
                "Make sure the Ollama server is running (check your taskbar or run `ollama serve`) \
                 and the model is available (`ollama pull {model}`)."
            ),
            Self::OpenAICompatible => format!(
                "Make sure the OpenAI-compatible server (e.g. LM Studio) is running \
                 and `{model}` is loaded."
            ),
        }
    }
}

impl FromStr for Backend {
    type Err = AnalystError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" | "openai-compatible" | "lmstudio" => Ok(Self::OpenAICompatible),
            other => Err(AnalystError::ConfigError(format!(
                "Unknown backend '{other}' (expected 'ollama' or 'openai')"
            ))),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ollama => write!(f, "ollama"),
            Self::OpenAICompatible => write!(f, "openai"),
        }
    }
}

/// How much the pipeline shows and whether generation is traced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineProfile {
    /// Four metric tiles, ten history lines, traced generation
    #[default]
    Detailed,
    /// Three metric tiles, five history lines, no tracing wrapper
    Compact,
}

impl PipelineProfile {
    /// Number of recent closes embedded in the prompt
    pub fn history_lines(self) -> usize {
        match self {
            Self::Detailed => 10,
            Self::Compact => 5,
        }
    }

    /// Metric tiles shown in the dashboard, in order
    pub fn tiles(self) -> &'static [MetricKind] {
        match self {
            Self::Detailed => &[
                MetricKind::CurrentPrice,
                MetricKind::MarketCap,
                MetricKind::PeRatio,
                MetricKind::Week52High,
            ],
            Self::Compact => &[
                MetricKind::CurrentPrice,
                MetricKind::PeRatio,
                MetricKind::Week52High,
            ],
        }
    }

    /// Whether generation is wrapped in a tracing span
    pub fn traced(self) -> bool {
        matches!(self, Self::Detailed)
    }
}

impl FromStr for PipelineProfile {
    type Err = AnalystError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "detailed" | "full" => Ok(Self::Detailed),
            "compact" | "lite" => Ok(Self::Compact),
            other => Err(AnalystError::ConfigError(format!(
                "Unknown profile '{other}' (expected 'detailed' or 'compact')"
            ))),
        }
    }
}

impl fmt::Display for PipelineProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Detailed => write!(f, "detailed"),
            Self::Compact => write!(f, "compact"),
        }
    }
}

/// Configuration for the analysis pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalystConfig {
    /// Ticker pre-filled in the selector
    pub default_ticker: String,

    /// Models the selector offers
    pub models: Vec<String>,

    /// Model selected when the user has not picked one
    pub default_model: String,

    /// Generation backend
    pub backend: Backend,

    /// Backend base URL; `None` uses the backend's default
    pub base_url: Option<String>,

    /// API key for OpenAI-compatible servers (local servers ignore it)
    pub api_key: Option<String>,

    /// Connect timeout for the generation backend
    pub connect_timeout: Duration,

    /// Request timeout for market data calls
    pub request_timeout: Duration,

    /// History window requested from the market data service
    pub lookback: String,

    /// Display and tracing profile
    pub profile: PipelineProfile,
}

impl Default for AnalystConfig {
    fn default() -> Self {
        Self {
            default_ticker: DEFAULT_TICKER.to_string(),
            models: DEFAULT_MODELS.iter().map(ToString::to_string).collect(),
            default_model: DEFAULT_MODELS[0].to_string(),
            backend: Backend::Ollama,
            base_url: None,
            api_key: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            lookback: "1mo".to_string(),
            profile: PipelineProfile::Detailed,
        }
    }
}

impl AnalystConfig {
    /// Create a new configuration builder
    pub fn builder() -> AnalystConfigBuilder {
        AnalystConfigBuilder::default()
    }

    /// Build a configuration from `ANALYST_*`, `OLLAMA_HOST` and `OPENAI_*` variables
    pub fn from_env() -> Result<Self> {
        Self::builder().with_env().build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.default_ticker.trim().is_empty() {
            return Err(AnalystError::ConfigError(
                "default_ticker must not be empty".to_string(),
            ));
        }

        if self.models.is_empty() {
            return Err(AnalystError::ConfigError(
                "at least one model must be offered".to_string(),
            ));
        }

        if !self.is_known_model(&self.default_model) {
            return Err(AnalystError::ConfigError(format!(
                "default model '{}' is not in the model list",
                self.default_model
            )));
        }

        if lookback_days(&self.lookback).is_none() {
            return Err(AnalystError::ConfigError(format!(
                "unsupported lookback '{}'",
                self.lookback
            )));
        }

        Ok(())
    }

    /// Whether the selector offers this model
    pub fn is_known_model(&self, model: &str) -> bool {
        self.models.iter().any(|m| m == model)
    }

    /// Effective base URL for the configured backend
    pub fn effective_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.backend.default_base_url())
    }

    /// Title of the price chart, e.g. "Price Trend (Last 30 Days)"
    pub fn chart_title(&self) -> String {
        let days = lookback_days(&self.lookback).unwrap_or(30);
        format!("Price Trend (Last {days} Days)")
    }
}

/// Builder for AnalystConfig
#[derive(Debug, Default)]
pub struct AnalystConfigBuilder {
    default_ticker: Option<String>,
    models: Option<Vec<String>>,
    default_model: Option<String>,
    backend: Option<Backend>,
    base_url: Option<String>,
    api_key: Option<String>,
    connect_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
    lookback: Option<String>,
    profile: Option<PipelineProfile>,
    env_error: Option<AnalystError>,
}

impl AnalystConfigBuilder {
    /// Set the default ticker (uppercased)
    pub fn default_ticker(mut self, ticker: impl Into<String>) -> Self {
        self.default_ticker = Some(ticker.into().trim().to_uppercase());
        self
    }

    /// Replace the offered model list
    pub fn models(mut self, models: Vec<String>) -> Self {
        self.models = Some(models);
        self
    }

    /// Set the default model
    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    /// Set the generation backend
    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set the backend base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the API key for OpenAI-compatible servers
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the backend connect timeout
    pub fn connect_timeout(mut self, duration: Duration) -> Self {
        self.connect_timeout = Some(duration);
        self
    }

    /// Set the market data request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set the history lookback window (e.g. "1mo")
    pub fn lookback(mut self, lookback: impl Into<String>) -> Self {
        self.lookback = Some(lookback.into());
        self
    }

    /// Set the pipeline profile
    pub fn profile(mut self, profile: PipelineProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Apply environment overrides
    ///
    /// An unparseable `ANALYST_BACKEND` or `ANALYST_PROFILE` is reported by
    /// [`build`](Self::build).
    pub fn with_env(self) -> Self {
        self.with_vars(|key| std::env::var(key).ok())
    }

    fn with_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(ticker) = var("ANALYST_TICKER") {
            self = self.default_ticker(ticker);
        }
        if let Some(model) = var("ANALYST_MODEL") {
            self = self.default_model(model);
        }
        if let Some(backend) = var("ANALYST_BACKEND") {
            match backend.parse() {
                Ok(backend) => self.backend = Some(backend),
                Err(e) => self.env_error = Some(e),
            }
        }
        if let Some(profile) = var("ANALYST_PROFILE") {
            match profile.parse() {
                Ok(profile) => self.profile = Some(profile),
                Err(e) => self.env_error = Some(e),
            }
        }

        let url_var = match self.backend.unwrap_or_default() {
            Backend::Ollama => "OLLAMA_HOST",
            Backend::OpenAICompatible => "OPENAI_API_BASE",
        };
        if let Some(url) = var(url_var) {
            self.base_url = Some(url);
        }
        if let Some(key) = var("OPENAI_API_KEY") {
            self.api_key = Some(key);
        }
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AnalystConfig> {
        if let Some(err) = self.env_error {
            return Err(err);
        }

        let defaults = AnalystConfig::default();

        let config = AnalystConfig {
            default_ticker: self.default_ticker.unwrap_or(defaults.default_ticker),
            models: self.models.unwrap_or(defaults.models),
            default_model: self.default_model.unwrap_or(defaults.default_model),
            backend: self.backend.unwrap_or(defaults.backend),
            base_url: self.base_url,
            api_key: self.api_key,
            connect_timeout: self.connect_timeout.unwrap_or(defaults.connect_timeout),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            lookback: self.lookback.unwrap_or(defaults.lookback),
            profile: self.profile.unwrap_or(defaults.profile),
        };

        config.validate()?;
        Ok(config)
    }
}
