//! Local AI stock analyst
//!
//! Fetches a month of market data for a ticker, shows the headline metrics
//! and price trend, then streams a short analysis from a locally hosted model.
//!
//! # Usage
//!
//! ```bash
//! # Make sure the model is available locally
//! ollama pull gemma3:1b
//!
//! # One analysis
//! cargo run -p analyst-cli -- NVDA --model gemma3:1b
//!
//! # Interactive session
//! cargo run -p analyst-cli -- --interactive
//! ```

mod chart;
mod repl;
mod terminal;

use analyst_llm::providers::{OllamaConfig, OllamaProvider};
use analyst_market::{
    AnalysisPipeline, AnalysisRequest, AnalystConfig, Backend, Dashboard, Notice, PipelineProfile,
};
use analyst_utils::LogFormat;
use anyhow::bail;
use clap::Parser;
use repl::Session;
use std::io;
use std::process::ExitCode;
use terminal::TerminalDashboard;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "local-analyst")]
#[command(about = "Stock dashboard with streamed analysis from a local model", long_about = None)]
struct Args {
    /// Ticker to analyse (default: NVDA, or ANALYST_TICKER)
    ticker: Option<String>,

    /// Model to generate the analysis with
    #[arg(short, long)]
    model: Option<String>,

    /// Display profile: detailed or compact
    #[arg(short, long)]
    profile: Option<PipelineProfile>,

    /// Generation backend: ollama or openai
    #[arg(short, long)]
    backend: Option<Backend>,

    /// Base URL of the generation backend
    #[arg(long)]
    base_url: Option<String>,

    /// Read tickers and commands from stdin
    #[arg(short, long)]
    interactive: bool,

    /// List the models installed on the Ollama server and exit
    #[arg(long)]
    list_models: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let log_format = if args.log_json {
        LogFormat::Json
    } else {
        analyst_utils::Config::from_env().log_format
    };
    analyst_utils::init_tracing_with(log_format);

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

async fn run(args: Args) -> anyhow::Result<ExitCode> {
    let config = build_config(&args)?;
    info!(
        backend = %config.backend,
        base_url = config.effective_base_url(),
        profile = %config.profile,
        "starting local-analyst"
    );

    if args.list_models {
        list_models(&config).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let model = config.default_model.clone();
    let mut dashboard = TerminalDashboard::stdout();

    if args.interactive {
        let mut session = Session::new(config, model, AnalysisPipeline::from_config)?;
        repl::run(&mut session, io::stdin().lock(), &mut dashboard).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let pipeline = AnalysisPipeline::from_config(&config)?;
    dashboard.notify(&Notice::tip(config.backend, &model))?;

    let request = AnalysisRequest::new(&config.default_ticker, model);
    match pipeline.run(&request, &mut dashboard).await {
        Ok(report) => {
            debug!(run_id = %report.run_id, fragments = report.fragments, "done");
            Ok(ExitCode::SUCCESS)
        },
        // Already shown on the dashboard
        Err(_) => Ok(ExitCode::FAILURE),
    }
}

fn build_config(args: &Args) -> analyst_market::Result<AnalystConfig> {
    let mut builder = AnalystConfig::builder();

    // The backend decides which URL variable the environment supplies
    if let Some(backend) = args.backend {
        builder = builder.backend(backend);
    }
    builder = builder.with_env();

    if let Some(backend) = args.backend {
        builder = builder.backend(backend);
    }
    if let Some(url) = &args.base_url {
        builder = builder.base_url(url);
    }
    if let Some(ticker) = &args.ticker {
        builder = builder.default_ticker(ticker.to_uppercase());
    }
    if let Some(model) = &args.model {
        builder = builder.default_model(model);
    }
    if let Some(profile) = args.profile {
        builder = builder.profile(profile);
    }

    builder.build()
}

async fn list_models(config: &AnalystConfig) -> anyhow::Result<()> {
    if config.backend != Backend::Ollama {
        bail!("--list-models is only supported for the Ollama backend");
    }

    let provider = OllamaProvider::with_config(
        OllamaConfig::new(config.effective_base_url())
            .with_connect_timeout(config.connect_timeout.as_secs()),
    )?;
    let installed = provider.list_models().await?;

    println!("Models on {}:", config.effective_base_url());
    for model in &installed {
        let marker = if config.is_known_model(model) { "*" } else { " " };
        println!("{marker} {model}");
    }
    for model in config.models.iter().filter(|m| !installed.contains(m)) {
        println!("  {model} (not pulled: ollama pull {model})");
    }

    Ok(())
}
