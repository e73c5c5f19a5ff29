//! Configuration management utilities

use crate::logging::LogFormat;
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application name
    pub app_name: String,
    /// Environment (dev, prod, etc.)
    pub environment: String,
    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "local-analyst".to_string(),
            environment: "development".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Build from `ANALYST_ENV` and `ANALYST_LOG_FORMAT`, falling back to defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(env) = std::env::var("ANALYST_ENV") {
            if !env.trim().is_empty() {
                config.environment = env;
            }
        }
        if let Some(format) = std::env::var("ANALYST_LOG_FORMAT")
            .ok()
            .and_then(|v| LogFormat::from_name(&v))
        {
            config.log_format = format;
        }
        config
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.as_str(), "prod" | "production")
    }
}
