//! OpenAI-compatible provider implementation
//!
//! Streams from `POST {api_base}/chat/completions` with `"stream": true`.
//! Works with local servers that speak the OpenAI protocol (LM Studio,
//! llama.cpp server, vLLM, Ollama's `/v1` endpoint).
//! See: https://platform.openai.com/docs/api-reference/chat/streaming
//!
//! # Example
//!
//! ```no_run
//! use analyst_llm::providers::{OpenAIConfig, OpenAIProvider};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // LM Studio on its default port; local servers ignore the key
//! let config = OpenAIConfig::new("not-needed")
//!     .with_api_base("http://localhost:1234/v1");
//!
//! let provider = OpenAIProvider::with_config(config)?;
//! # Ok(())
//! # }
//! ```

use crate::stream::{LineDecoder, LineEvent, decode_lines, interrupted};
use crate::{FragmentStream, GenerationProvider, GenerationRequest, LLMError, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_OPENAI_API_BASE: &str = "http://localhost:1234/v1";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Configuration for OpenAI-compatible provider
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication (local servers accept any value)
    pub api_key: String,

    /// Base URL for the API (default: "http://localhost:1234/v1")
    pub api_base: String,

    /// Connect timeout in seconds (default: 10)
    pub connect_timeout_secs: u64,
}

impl OpenAIConfig {
    /// Create a new config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }

    /// Set custom API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set connect timeout in seconds
    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }
}

/// OpenAI-compatible streaming provider
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    /// Create a new provider with custom configuration
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

#[async_trait]
impl GenerationProvider for OpenAIProvider {
    #[instrument(skip(self, request), fields(model = %request.model, api_base = %self.config.api_base))]
    async fn open_stream(&self, request: GenerationRequest) -> Result<FragmentStream> {
        request.validate()?;
        debug!("Opening chat completion stream at {}", self.config.api_base);

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        let body = ChatRequest {
            model: &request.model,
            messages,
            stream: true,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| LLMError::from_send(&self.config.api_base, e))?;

        // Handle errors
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                401 => LLMError::AuthenticationFailed,
                400 => LLMError::InvalidRequest(error_text),
                404 => LLMError::ModelNotFound(request.model),
                503 => LLMError::ModelUnavailable {
                    endpoint: self.config.api_base.clone(),
                    reason: error_text,
                },
                _ => LLMError::RequestFailed(format!("HTTP {status}: {error_text}")),
            });
        }

        let body = response.bytes_stream().map(|chunk| chunk.map_err(interrupted));
        Ok(decode_lines(body, SseDecoder))
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ChunkError>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkError {
    message: String,
}

/// Decodes server-sent events carrying chat completion chunks
struct SseDecoder;

impl LineDecoder for SseDecoder {
    fn decode(&mut self, line: &str) -> Result<LineEvent> {
        // Comments, event names, ids and blank separators carry no text
        let Some(data) = line.strip_prefix("data:") else {
            return Ok(LineEvent::Skip);
        };
        let data = data.trim();
        if data == "[DONE]" {
            return Ok(LineEvent::Final(None));
        }

        let chunk: ChatChunk = serde_json::from_str(data).map_err(|e| {
            LLMError::UnexpectedResponse(format!("Failed to parse stream chunk: {e}"))
        })?;

        if let Some(error) = chunk.error {
            return Err(LLMError::StreamInterrupted(error.message));
        }

        // Extract first choice (we never request more than one)
        let Some(choice) = chunk.choices.into_iter().next() else {
            return Ok(LineEvent::Skip);
        };

        match (choice.delta.content, choice.finish_reason) {
            (content, Some(reason)) => {
                debug!("Chat completion finished: {}", reason);
                Ok(LineEvent::Final(content.filter(|c| !c.is_empty())))
            },
            (Some(content), None) => Ok(LineEvent::Fragment(content)),
            (None, None) => Ok(LineEvent::Skip),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
