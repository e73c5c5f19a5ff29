//! Logging and tracing utilities
//!
//! The subscriber is process-wide state: it is installed at most once, no
//! matter how many times the dashboard triggers a pipeline run. Output goes
//! to stderr so the dashboard owns stdout.

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "warn,analyst_market=info,analyst_cli=info";

static TRACING: OnceLock<LogFormat> = OnceLock::new();

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, one event per line
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    /// Parse from a config or environment value, case-insensitive
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "pretty" | "text" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Initialize tracing subscriber with default configuration
pub fn init_tracing() -> bool {
    init_tracing_with(LogFormat::Pretty)
}

/// Initialize tracing with the given output format
///
/// Returns `true` only for the call that actually installed the subscriber.
/// Later calls are no-ops, whatever format they ask for.
pub fn init_tracing_with(format: LogFormat) -> bool {
    let mut installed = false;
    TRACING.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let registry = tracing_subscriber::registry().with(filter);

        // try_init fails if a global subscriber already exists (e.g. in tests)
        let result = match format {
            LogFormat::Pretty => registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init(),
            LogFormat::Json => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .try_init(),
        };
        installed = result.is_ok();
        format
    });
    installed
}

/// Whether the one-time initialization has already run
pub fn is_initialized() -> bool {
    TRACING.get().is_some()
}

/// Format chosen by the first initialization, if any
pub fn active_format() -> Option<LogFormat> {
    TRACING.get().copied()
}
