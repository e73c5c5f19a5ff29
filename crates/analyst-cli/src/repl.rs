//! Interactive mode: one analysis per line of input

use crate::terminal::TerminalDashboard;
use analyst_market::{
    AnalysisPipeline, AnalysisRequest, AnalystConfig, Backend, Dashboard, Notice, PipelineProfile,
};
use anyhow::{bail, Result};
use std::io::{BufRead, Write};
use tracing::{debug, warn};

/// Builds a pipeline for the current configuration
pub type PipelineFactory = fn(&AnalystConfig) -> analyst_market::Result<AnalysisPipeline>;

/// Parsed line of user input
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Analyse a ticker; `None` repeats the last one
    Analyze { ticker: Option<String> },
    /// Switch model, or show the current one
    Model { id: Option<String> },
    /// Switch display profile
    Profile { profile: PipelineProfile },
    /// List the offered models
    Models,
    Help,
    Quit,
}

impl Command {
    /// Parse a line; bare words are tickers, `/`-prefixed words are commands
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        if input.is_empty() {
            bail!("Empty input");
        }

        let Some(rest) = input.strip_prefix('/') else {
            return Ok(Command::Analyze {
                ticker: Some(parse_ticker(input)?),
            });
        };

        let parts: Vec<&str> = rest.split_whitespace().collect();
        let Some(cmd) = parts.first().map(|c| c.to_lowercase()) else {
            bail!("Empty command");
        };
        let args = &parts[1..];

        match cmd.as_str() {
            "analyze" | "a" => Ok(Command::Analyze {
                ticker: args.first().map(|t| parse_ticker(t)).transpose()?,
            }),
            "model" | "m" => Ok(Command::Model {
                id: args.first().map(ToString::to_string),
            }),
            "profile" | "p" => {
                let Some(name) = args.first() else {
                    bail!("Missing profile name (detailed or compact)");
                };
                Ok(Command::Profile {
                    profile: name.parse()?,
                })
            },
            "models" | "list" => Ok(Command::Models),
            "help" | "h" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            _ => bail!("Unknown command: /{cmd} (try /help)"),
        }
    }
}

fn parse_ticker(input: &str) -> Result<String> {
    let ticker = input.trim();
    if ticker.split_whitespace().count() != 1 {
        bail!("Enter one ticker at a time");
    }
    Ok(ticker.to_uppercase())
}

pub const HELP: &str = "\
Commands:
  <TICKER>            Analyse a ticker, e.g. NVDA
  /analyze [TICKER]   Analyse a ticker (default: the last one)
  /model [ID]         Switch model, or show the current one
  /models             List available models
  /profile <NAME>     Switch profile: detailed or compact
  /help               Show this help
  /quit               Exit";

/// Whether the loop should keep reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Interactive state: selected ticker, model and the pipeline for the profile
pub struct Session {
    config: AnalystConfig,
    ticker: String,
    model: String,
    pipeline: AnalysisPipeline,
    build: PipelineFactory,
}

impl Session {
    pub fn new(config: AnalystConfig, model: impl Into<String>, build: PipelineFactory) -> Result<Self> {
        let pipeline = build(&config)?;
        Ok(Self {
            ticker: config.default_ticker.clone(),
            model: model.into(),
            config,
            pipeline,
            build,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn backend(&self) -> Backend {
        self.config.backend
    }

    pub fn profile(&self) -> PipelineProfile {
        self.pipeline.profile()
    }

    /// Carry out one command
    pub async fn execute<W: Write + Send>(
        &mut self,
        command: Command,
        dashboard: &mut TerminalDashboard<W>,
    ) -> Result<Flow> {
        match command {
            Command::Analyze { ticker } => {
                if let Some(ticker) = ticker {
                    self.ticker = ticker;
                }
                let request = AnalysisRequest::new(&self.ticker, self.model.clone());
                if let Err(e) = self.pipeline.run(&request, dashboard).await {
                    debug!(error = %e, "analysis ended with an error");
                }
            },
            Command::Model { id: None } => {
                dashboard.println(&format!("Current model: {}", self.model))?;
            },
            Command::Model { id: Some(id) } => {
                if self.config.is_known_model(&id) {
                    self.model = id;
                    dashboard.notify(&Notice::tip(self.config.backend, &self.model))?;
                } else {
                    dashboard.notify(&Notice::warning(format!(
                        "Unknown model '{id}'. Available: {}",
                        self.config.models.join(", ")
                    )))?;
                }
            },
            Command::Profile { profile } => {
                let mut config = self.config.clone();
                config.profile = profile;
                match (self.build)(&config) {
                    Ok(pipeline) => {
                        self.pipeline = pipeline;
                        self.config = config;
                        dashboard.println(&format!("Profile: {}", self.profile()))?;
                    },
                    Err(e) => dashboard.notify(&Notice::error(e.to_string()))?,
                }
            },
            Command::Models => {
                for model in &self.config.models {
                    let marker = if *model == self.model { "*" } else { " " };
                    dashboard.println(&format!("{marker} {model}"))?;
                }
            },
            Command::Help => dashboard.println(HELP)?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }
}

/// Read commands from `input` until EOF or `/quit`
pub async fn run<R: BufRead, W: Write + Send>(
    session: &mut Session,
    mut input: R,
    dashboard: &mut TerminalDashboard<W>,
) -> Result<()> {
    dashboard.notify(&Notice::idle())?;
    dashboard.notify(&Notice::tip(session.backend(), session.model()))?;

    loop {
        dashboard.prompt(&format!("\n[{} | {}] > ", session.model(), session.ticker()))?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            dashboard.println("\nGoodbye!")?;
            break;
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(e) => {
                warn!(input = line, error = %e, "invalid input");
                dashboard.notify(&Notice::warning(e.to_string()))?;
                continue;
            },
        };

        if session.execute(command, dashboard).await? == Flow::Quit {
            dashboard.println("Goodbye!")?;
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use analyst_llm::{FragmentStream, GenerationProvider, GenerationRequest};
    use analyst_market::{MarketData, PricePoint, QuoteMetadata};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use futures::{stream, StreamExt};
    use serde_json::json;
    use std::io::Cursor;
    use std::sync::Arc;

    struct StaticMarket;

    #[async_trait]
    impl MarketData for StaticMarket {
        async fn quote_metadata(&self, ticker: &str) -> analyst_market::Result<QuoteMetadata> {
            Ok(QuoteMetadata::from_value(json!({
                "longName": format!("{ticker} Holdings"),
                "currentPrice": 42.0,
                "currency": "USD"
            })))
        }

        async fn historical_closes(&self, ticker: &str, _lookback: &str) -> analyst_market::Result<Vec<PricePoint>> {
            if ticker == "EMPTY" {
                return Ok(Vec::new());
            }
            Ok((1..=12)
                .map(|d| PricePoint::new(NaiveDate::from_ymd_opt(2024, 9, d).unwrap(), 40.0 + f64::from(d)))
                .collect())
        }
    }

    /// Answers with the model name
    struct EchoModel;

    #[async_trait]
    impl GenerationProvider for EchoModel {
        async fn open_stream(&self, request: GenerationRequest) -> analyst_llm::Result<FragmentStream> {
            let items: Vec<analyst_llm::Result<String>> =
                vec![Ok("Summary from ".to_string()), Ok(request.model)];
            Ok(stream::iter(items).boxed())
        }

        fn name(&self) -> &'static str {
            "echo"
        }
    }

    fn fake_pipeline(config: &AnalystConfig) -> analyst_market::Result<AnalysisPipeline> {
        AnalysisPipeline::new(Arc::new(StaticMarket), Arc::new(EchoModel), config.profile)
    }

    fn session() -> Session {
        Session::new(AnalystConfig::default(), "gemma3:1b", fake_pipeline).unwrap()
    }

    async fn run_script(script: &str) -> String {
        let mut session = session();
        let mut dashboard = TerminalDashboard::new(Vec::new());
        run(&mut session, Cursor::new(script.to_string()), &mut dashboard)
            .await
            .unwrap();
        String::from_utf8(dashboard.into_inner()).unwrap()
    }

    #[test]
    fn test_parse_ticker() {
        assert_eq!(
            Command::parse(" nvda ").unwrap(),
            Command::Analyze {
                ticker: Some("NVDA".to_string())
            }
        );
        assert!(Command::parse("nvda aapl").is_err());
        assert!(Command::parse("   ").is_err());
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/analyze").unwrap(), Command::Analyze { ticker: None });
        assert_eq!(
            Command::parse("/a msft").unwrap(),
            Command::Analyze {
                ticker: Some("MSFT".to_string())
            }
        );
        assert_eq!(
            Command::parse("/model deepseek-r1:7b").unwrap(),
            Command::Model {
                id: Some("deepseek-r1:7b".to_string())
            }
        );
        assert_eq!(
            Command::parse("/PROFILE compact").unwrap(),
            Command::Profile {
                profile: PipelineProfile::Compact
            }
        );
        assert_eq!(Command::parse("/models").unwrap(), Command::Models);
        assert_eq!(Command::parse("/q").unwrap(), Command::Quit);
        assert!(Command::parse("/profile").is_err());
        assert!(Command::parse("/profile loud").is_err());
        assert!(Command::parse("/dance").is_err());
        assert!(Command::parse("/").is_err());
    }

    #[tokio::test]
    async fn test_model_switch() {
        let mut session = session();
        let mut dashboard = TerminalDashboard::new(Vec::new());

        let flow = session
            .execute(Command::Model { id: Some("llama3.1".to_string()) }, &mut dashboard)
            .await
            .unwrap();
        assert_eq!(flow, Flow::Continue);
        assert_eq!(session.model(), "llama3.1");

        session
            .execute(Command::Model { id: Some("gpt-4o".to_string()) }, &mut dashboard)
            .await
            .unwrap();
        assert_eq!(session.model(), "llama3.1");

        let out = String::from_utf8(dashboard.into_inner()).unwrap();
        assert!(out.contains("ollama pull llama3.1"));
        assert!(out.contains("Unknown model 'gpt-4o'"));
    }

    #[tokio::test]
    async fn test_model_tip_follows_backend() {
        let config = AnalystConfig {
            backend: Backend::OpenAICompatible,
            ..AnalystConfig::default()
        };
        let mut session = Session::new(config, "gemma3:1b", fake_pipeline).unwrap();
        let mut dashboard = TerminalDashboard::new(Vec::new());

        session
            .execute(Command::Model { id: Some("llama3.1".to_string()) }, &mut dashboard)
            .await
            .unwrap();

        let out = String::from_utf8(dashboard.into_inner()).unwrap();
        assert!(out.contains("OpenAI-compatible server is running with `llama3.1` loaded"));
        assert!(!out.contains("ollama pull"));
    }

    #[tokio::test]
    async fn test_profile_switch_rebuilds_pipeline() {
        let mut session = session();
        let mut dashboard = TerminalDashboard::new(Vec::new());
        assert_eq!(session.profile(), PipelineProfile::Detailed);

        session
            .execute(Command::Profile { profile: PipelineProfile::Compact }, &mut dashboard)
            .await
            .unwrap();
        assert_eq!(session.profile(), PipelineProfile::Compact);
    }

    #[tokio::test]
    async fn test_run_analyses_and_quits() {
        let out = run_script("amd\n/quit\nnvda\n").await;

        assert!(out.contains("Enter a stock ticker"));
        assert!(out.contains("Financial Overview: AMD Holdings (AMD)"));
        assert!(out.contains("Summary from gemma3:1b\n"));
        assert!(out.contains("Goodbye!"));
        assert!(!out.contains("NVDA Holdings"));
    }

    #[tokio::test]
    async fn test_run_keeps_going_after_errors() {
        let out = run_script("/bogus\nempty\n/model deepseek-r1:1.5b\n/analyze\n").await;

        assert!(out.contains("Unknown command: /bogus"));
        assert!(out.contains("No data found for this ticker."));
        // The failed ticker is remembered and retried with the new model
        assert!(out.contains("[deepseek-r1:1.5b | EMPTY] > "));
        assert!(out.trim_end().ends_with("Goodbye!"));
    }
}
