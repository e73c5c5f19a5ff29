//! Line-oriented decoding of streamed HTTP bodies
//!
//! Both supported backends flush text as newline-delimited records: Ollama
//! sends one JSON object per line, OpenAI-compatible servers send SSE
//! `data:` lines. This module turns a byte stream into a [`FragmentStream`]
//! given a per-line decoder.

use crate::{FragmentStream, LLMError, Result};
use futures::stream::{self, BoxStream, Stream, StreamExt};
use std::collections::VecDeque;
use tracing::warn;

/// What one decoded line contributes to the output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// A piece of generated text
    Fragment(String),
    /// A piece of generated text that is also the last one
    Final(Option<String>),
    /// Keep-alives, comments, empty deltas
    Skip,
}

/// Decodes one complete line of a streamed response
pub trait LineDecoder: Send {
    fn decode(&mut self, line: &str) -> Result<LineEvent>;
}

/// Splits arbitrary byte chunks into complete lines
///
/// Bytes are only converted to text once a full line is available, so a
/// multi-byte character split across chunks is never mangled.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Take whatever is left after the body ended without a trailing newline
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.iter().all(u8::is_ascii_whitespace) {
            self.pending.clear();
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(String::from_utf8_lossy(&rest).trim_end().to_string())
    }
}

struct DecodeState<B, D> {
    body: BoxStream<'static, Result<B>>,
    lines: LineBuffer,
    decoder: D,
    ready: VecDeque<Result<String>>,
    finished: bool,
}

impl<B, D> DecodeState<B, D>
where
    D: LineDecoder,
{
    fn feed(&mut self, line: &str) {
        if self.finished {
            return;
        }
        match self.decoder.decode(line) {
            Ok(LineEvent::Fragment(text)) => self.ready.push_back(Ok(text)),
            Ok(LineEvent::Final(text)) => {
                if let Some(text) = text {
                    self.ready.push_back(Ok(text));
                }
                self.finished = true;
            },
            Ok(LineEvent::Skip) => {}
            Err(e) => {
                self.ready.push_back(Err(e));
                self.finished = true;
            },
        }
    }
}

/// Decode a streamed body into fragments, line by line
///
/// Fragments come out in arrival order. Nothing after the decoder reports
/// the final line, or after the first error, is emitted. Empty fragments
/// are dropped since they carry no text.
pub fn decode_lines<B, S, D>(body: S, decoder: D) -> FragmentStream
where
    B: AsRef<[u8]> + Send + 'static,
    S: Stream<Item = Result<B>> + Send + 'static,
    D: LineDecoder + 'static,
{
    let state = DecodeState {
        body: body.boxed(),
        lines: LineBuffer::new(),
        decoder,
        ready: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.ready.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            match state.body.next().await {
                Some(Ok(chunk)) => {
                    for line in state.lines.push(chunk.as_ref()) {
                        state.feed(&line);
                    }
                },
                Some(Err(e)) => {
                    state.ready.push_back(Err(e));
                    state.finished = true;
                },
                None => {
                    if let Some(rest) = state.lines.finish() {
                        state.feed(&rest);
                    }
                    if !state.finished {
                        warn!("generation stream closed without a completion marker");
                        state.finished = true;
                    }
                },
            }
        }
    })
    .filter(|item| futures::future::ready(!matches!(item, Ok(text) if text.is_empty())))
    .boxed()
}

/// Map a transport error raised mid-body
pub(crate) fn interrupted(err: reqwest::Error) -> LLMError {
    LLMError::StreamInterrupted(err.to_string())
}
