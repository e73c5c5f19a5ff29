//! Ollama provider implementation
//!
//! Streams from the native Ollama API (`POST /api/generate` with
//! `"stream": true`), which answers with one JSON object per line:
//!
//! ```text
//! {"model":"gemma3:1b","response":"NVIDIA","done":false}
//! {"model":"gemma3:1b","response":" shares","done":false}
//! {"model":"gemma3:1b","response":"","done":true,"done_reason":"stop"}
//! ```
//!
//! # Example
//!
//! ```no_run
//! use analyst_llm::{GenerationProvider, GenerationRequest};
//! use analyst_llm::providers::OllamaProvider;
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = OllamaProvider::from_env()?;
//!     let mut stream = provider
//!         .open_stream(GenerationRequest::new("gemma3:1b", "Say hello"))
//!         .await?;
//!
//!     while let Some(fragment) = stream.next().await {
//!         print!("{}", fragment?);
//!     }
//!     Ok(())
//! }
//! ```

use crate::stream::{LineDecoder, LineEvent, decode_lines, interrupted};
use crate::{FragmentStream, GenerationProvider, GenerationRequest, LLMError, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Address of a default `ollama serve`
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Configuration for the Ollama provider
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Base URL of the Ollama server (default: "http://localhost:11434")
    pub base_url: String,

    /// Connect timeout in seconds. Fragment arrival itself is never timed out.
    pub connect_timeout_secs: u64,

    /// How long Ollama keeps the model loaded after the request (e.g. "5m")
    pub keep_alive: Option<String>,
}

impl OllamaConfig {
    /// Create a config pointing at the given server
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_host(&base_url.into()),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            keep_alive: None,
        }
    }

    /// Create config from environment variable
    ///
    /// Reads `OLLAMA_HOST`, the same variable the Ollama CLI uses. A bare
    /// `host:port` is accepted.
    pub fn from_env() -> Self {
        std::env::var("OLLAMA_HOST")
            .ok()
            .filter(|h| !h.trim().is_empty())
            .map_or_else(Self::default, Self::new)
    }

    /// Set the server base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize_host(&base_url.into());
        self
    }

    /// Set connect timeout in seconds
    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    /// Set the keep-alive hint sent with each request
    pub fn with_keep_alive(mut self, keep_alive: impl Into<String>) -> Self {
        self.keep_alive = Some(keep_alive.into());
        self
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self::new(DEFAULT_OLLAMA_HOST)
    }
}

/// Port `ollama serve` listens on unless told otherwise
const DEFAULT_OLLAMA_PORT: u16 = 11434;

/// Turn an `OLLAMA_HOST`-style value into a base URL
///
/// Like the Ollama CLI, a missing scheme means `http` and a missing port on
/// an `http` address means 11434.
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    let (scheme, rest) = host.split_once("://").unwrap_or(("http", host));
    let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));

    // "[::1]" splits into "[:" and "1]", which is not a port
    let has_port = authority
        .rsplit_once(':')
        .is_some_and(|(_, port)| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()));

    let mut url = if has_port || scheme != "http" {
        format!("{scheme}://{authority}")
    } else {
        format!("{scheme}://{authority}:{DEFAULT_OLLAMA_PORT}")
    };
    if !path.is_empty() {
        url.push('/');
        url.push_str(path);
    }
    url
}

/// Ollama provider
///
/// Any model pulled into the local Ollama library can be addressed by its
/// tag, e.g. `gemma3:1b`, `deepseek-r1:7b`, `llama3.1`.
pub struct OllamaProvider {
    client: Client,
    config: OllamaConfig,
}

impl OllamaProvider {
    /// Create a new Ollama provider with custom configuration
    pub fn with_config(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a provider for the default local server
    pub fn new() -> Result<Self> {
        Self::with_config(OllamaConfig::default())
    }

    /// Create a provider from `OLLAMA_HOST`
    pub fn from_env() -> Result<Self> {
        Self::with_config(OllamaConfig::from_env())
    }

    /// Get the current configuration
    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url)
    }

    /// List the models available on the server (`GET /api/tags`)
    #[instrument(skip(self), fields(base_url = %self.config.base_url))]
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = self.endpoint("api/tags");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LLMError::from_send(&self.config.base_url, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(LLMError::RequestFailed(format!("HTTP {status}: {error_text}")));
        }

        let tags: OllamaTags = response.json().await.map_err(|e| {
            LLMError::UnexpectedResponse(format!("Failed to parse model list: {e}"))
        })?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

#[async_trait]
impl GenerationProvider for OllamaProvider {
    #[instrument(skip(self, request), fields(model = %request.model, base_url = %self.config.base_url))]
    async fn open_stream(&self, request: GenerationRequest) -> Result<FragmentStream> {
        request.validate()?;
        debug!("Opening Ollama generation stream");

        let body = OllamaGenerateRequest {
            model: &request.model,
            prompt: &request.prompt,
            system: request.system.as_deref(),
            stream: true,
            options: OllamaOptions::from_request(&request),
            keep_alive: self.config.keep_alive.as_deref(),
        };

        let response = self
            .client
            .post(self.endpoint("api/generate"))
            .json(&body)
            .send()
            .await
            .map_err(|e| LLMError::from_send(&self.config.base_url, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OllamaErrorBody>(&error_text)
                .map(|b| b.error)
                .unwrap_or(error_text);

            return Err(match status.as_u16() {
                404 => LLMError::ModelNotFound(request.model),
                400 => LLMError::InvalidRequest(message),
                503 => LLMError::ModelUnavailable {
                    endpoint: self.config.base_url.clone(),
                    reason: message,
                },
                _ => LLMError::RequestFailed(format!("HTTP {status}: {message}")),
            });
        }

        let body = response.bytes_stream().map(|chunk| chunk.map_err(interrupted));
        Ok(decode_lines(body, OllamaDecoder { model: request.model }))
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<usize>,
}

impl OllamaOptions {
    fn from_request(request: &GenerationRequest) -> Option<Self> {
        if request.temperature.is_none() && request.max_tokens.is_none() {
            return None;
        }
        Some(Self {
            temperature: request.temperature,
            num_predict: request.max_tokens,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OllamaChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    eval_count: Option<usize>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct OllamaTags {
    #[serde(default)]
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}

/// Decodes the NDJSON lines of `/api/generate`
struct OllamaDecoder {
    model: String,
}

impl LineDecoder for OllamaDecoder {
    fn decode(&mut self, line: &str) -> Result<LineEvent> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(LineEvent::Skip);
        }

        let chunk: OllamaChunk = serde_json::from_str(line).map_err(|e| {
            LLMError::UnexpectedResponse(format!("Failed to parse stream line: {e}"))
        })?;

        if let Some(error) = chunk.error {
            return Err(if error.contains("not found") {
                LLMError::ModelNotFound(self.model.clone())
            } else {
                LLMError::StreamInterrupted(error)
            });
        }

        if chunk.done {
            debug!(
                done_reason = chunk.done_reason.as_deref().unwrap_or("unknown"),
                eval_count = chunk.eval_count.unwrap_or_default(),
                "Ollama generation finished"
            );
            let tail = (!chunk.response.is_empty()).then_some(chunk.response);
            return Ok(LineEvent::Final(tail));
        }

        Ok(LineEvent::Fragment(chunk.response))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::test_server::{closed_port, serve_once};
    use futures::TryStreamExt;

    #[test]
    fn test_default_config() {
        let config = OllamaConfig::default();
        assert_eq!(config.base_url, "http://localhost:11434");
        assert!(config.keep_alive.is_none());
    }

    #[test]
    fn test_bare_host_is_normalized() {
        let config = OllamaConfig::new("127.0.0.1:11434/");
        assert_eq!(config.base_url, "http://127.0.0.1:11434");

        let config = OllamaConfig::default().with_base_url("https://gpu-box:11434");
        assert_eq!(config.base_url, "https://gpu-box:11434");
    }

    #[test]
    fn test_host_without_port_gets_ollama_port() {
        assert_eq!(OllamaConfig::new("127.0.0.1").base_url, "http://127.0.0.1:11434");
        assert_eq!(OllamaConfig::new("0.0.0.0").base_url, "http://0.0.0.0:11434");
        assert_eq!(OllamaConfig::new("gpu-box/").base_url, "http://gpu-box:11434");
        assert_eq!(OllamaConfig::new("http://gpu-box").base_url, "http://gpu-box:11434");
        assert_eq!(OllamaConfig::new("[::1]").base_url, "http://[::1]:11434");
        assert_eq!(OllamaConfig::new("[::1]:8080").base_url, "http://[::1]:8080");
        assert_eq!(
            OllamaConfig::new("proxy.local/ollama").base_url,
            "http://proxy.local:11434/ollama"
        );
        // TLS endpoints keep the scheme's own default port
        assert_eq!(OllamaConfig::new("https://ollama.example.com").base_url, "https://ollama.example.com");
    }

    #[test]
    fn test_decoder_fragments_and_final() {
        let mut decoder = OllamaDecoder {
            model: "gemma3:1b".to_string(),
        };
        assert_eq!(
            decoder.decode(r#"{"response":"Hi","done":false}"#).unwrap(),
            LineEvent::Fragment("Hi".to_string())
        );
        assert_eq!(decoder.decode("").unwrap(), LineEvent::Skip);
        assert_eq!(
            decoder
                .decode(r#"{"response":"","done":true,"done_reason":"stop"}"#)
                .unwrap(),
            LineEvent::Final(None)
        );
    }

    #[test]
    fn test_decoder_error_line() {
        let mut decoder = OllamaDecoder {
            model: "llama3.1".to_string(),
        };
        let err = decoder
            .decode(r#"{"error":"model 'llama3.1' not found, try pulling it first"}"#)
            .unwrap_err();
        assert!(matches!(err, LLMError::ModelNotFound(ref m) if m == "llama3.1"));

        let err = decoder.decode(r#"{"error":"out of memory"}"#).unwrap_err();
        assert!(matches!(err, LLMError::StreamInterrupted(_)));
    }

    #[test]
    fn test_options_only_when_set() {
        assert!(OllamaOptions::from_request(&GenerationRequest::new("m", "p")).is_none());

        let request = GenerationRequest::builder("m", "p").temperature(0.1).build();
        let options = OllamaOptions::from_request(&request).unwrap();
        assert_eq!(options.temperature, Some(0.1));
        assert_eq!(options.num_predict, None);
    }

    #[tokio::test]
    async fn test_stream_from_server() {
        let body = concat!(
            "{\"model\":\"gemma3:1b\",\"response\":\"NVDA \",\"done\":false}\n",
            "{\"model\":\"gemma3:1b\",\"response\":\"looks \",\"done\":false}\n",
            "{\"model\":\"gemma3:1b\",\"response\":\"strong.\",\"done\":false}\n",
            "{\"model\":\"gemma3:1b\",\"response\":\"\",\"done\":true,\"done_reason\":\"stop\"}\n",
        );
        let (base_url, server) = serve_once("200 OK", "application/x-ndjson", body).await;

        let provider = OllamaProvider::with_config(OllamaConfig::new(base_url)).unwrap();
        let fragments: Vec<String> = provider
            .open_stream(GenerationRequest::new("gemma3:1b", "Summarize NVDA"))
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        assert_eq!(fragments, vec!["NVDA ", "looks ", "strong."]);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/generate"));
        assert!(request.contains("\"stream\":true"));
        assert!(request.contains("\"model\":\"gemma3:1b\""));
    }

    #[tokio::test]
    async fn test_missing_model_is_reported() {
        let (base_url, _server) = serve_once(
            "404 Not Found",
            "application/json",
            r#"{"error":"model \"deepseek-r1:7b\" not found, try pulling it first"}"#,
        )
        .await;

        let provider = OllamaProvider::with_config(OllamaConfig::new(base_url)).unwrap();
        let err = provider
            .open_stream(GenerationRequest::new("deepseek-r1:7b", "hi"))
            .await
            .err()
            .unwrap();

        assert!(matches!(err, LLMError::ModelNotFound(ref m) if m == "deepseek-r1:7b"));
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let provider = OllamaProvider::with_config(OllamaConfig::new(closed_port().await)).unwrap();
        let err = provider
            .open_stream(GenerationRequest::new("gemma3:1b", "hi"))
            .await
            .err()
            .unwrap();

        assert!(err.is_unavailable(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn test_list_models() {
        let (base_url, _server) = serve_once(
            "200 OK",
            "application/json",
            r#"{"models":[{"name":"gemma3:1b","size":1},{"name":"llama3.1:latest","size":2}]}"#,
        )
        .await;

        let provider = OllamaProvider::with_config(OllamaConfig::new(base_url)).unwrap();
        let models = provider.list_models().await.unwrap();
        assert_eq!(models, vec!["gemma3:1b", "llama3.1:latest"]);
    }

    #[tokio::test]
    #[ignore] // Requires a running Ollama server with gemma3:1b pulled
    async fn test_live_generation() {
        let provider = OllamaProvider::from_env().unwrap();
        let text: String = provider
            .open_stream(GenerationRequest::new("gemma3:1b", "Reply with one word."))
            .await
            .unwrap()
            .try_collect::<Vec<_>>()
            .await
            .unwrap()
            .concat();
        assert!(!text.is_empty());
    }
}
