//! Tracing wrapper for generation providers
//!
//! [`TracedProvider`] records a span around the session open and per-stream
//! statistics. Fragments pass through untouched, so wrapping a provider
//! never changes what a consumer sees.

use crate::{FragmentStream, GenerationProvider, GenerationRequest, Result};
use async_trait::async_trait;
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tracing::{Instrument, Span, debug, info, info_span, warn};

/// A provider that instruments another provider
pub struct TracedProvider {
    inner: Arc<dyn GenerationProvider>,
}

impl TracedProvider {
    pub fn new(inner: Arc<dyn GenerationProvider>) -> Self {
        Self { inner }
    }

    /// The wrapped provider
    pub fn inner(&self) -> &Arc<dyn GenerationProvider> {
        &self.inner
    }
}

#[async_trait]
impl GenerationProvider for TracedProvider {
    async fn open_stream(&self, request: GenerationRequest) -> Result<FragmentStream> {
        let span = info_span!(
            "generation",
            provider = self.inner.name(),
            model = %request.model,
            prompt_chars = request.prompt.len(),
        );

        let started = Instant::now();
        let opened = self.inner.open_stream(request).instrument(span.clone()).await;

        match opened {
            Ok(stream) => {
                span.in_scope(|| debug!(elapsed_ms = started.elapsed().as_millis(), "stream opened"));
                Ok(TracedStream {
                    inner: stream,
                    span,
                    started,
                    fragments: 0,
                    chars: 0,
                }
                .boxed())
            },
            Err(e) => {
                span.in_scope(|| warn!(error = %e, "failed to open generation stream"));
                Err(e)
            },
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Counts what flows through and reports once the stream ends
struct TracedStream {
    inner: FragmentStream,
    span: Span,
    started: Instant,
    fragments: usize,
    chars: usize,
}

impl Stream for TracedStream {
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        let _entered = this.span.enter();

        let polled = this.inner.poll_next_unpin(cx);
        match &polled {
            Poll::Ready(Some(Ok(fragment))) => {
                this.fragments += 1;
                this.chars += fragment.len();
            },
            Poll::Ready(Some(Err(e))) => {
                warn!(error = %e, fragments = this.fragments, "generation stream failed");
            },
            Poll::Ready(None) => {
                info!(
                    fragments = this.fragments,
                    chars = this.chars,
                    elapsed_ms = this.started.elapsed().as_millis(),
                    "generation finished"
                );
            },
            Poll::Pending => {}
        }
        polled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LLMError;
    use futures::TryStreamExt;
    use futures::stream;

    struct FixedProvider {
        fragments: Vec<&'static str>,
    }

    #[async_trait]
    impl GenerationProvider for FixedProvider {
        async fn open_stream(&self, _request: GenerationRequest) -> Result<FragmentStream> {
            let items: Vec<Result<String>> =
                self.fragments.iter().map(|f| Ok((*f).to_string())).collect();
            Ok(stream::iter(items).boxed())
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct DownProvider;

    #[async_trait]
    impl GenerationProvider for DownProvider {
        async fn open_stream(&self, _request: GenerationRequest) -> Result<FragmentStream> {
            Err(LLMError::ModelUnavailable {
                endpoint: "http://localhost:11434".to_string(),
                reason: "connection refused".to_string(),
            })
        }

        fn name(&self) -> &'static str {
            "down"
        }
    }

    #[tokio::test]
    async fn test_output_is_unchanged() {
        let inner: Arc<dyn GenerationProvider> = Arc::new(FixedProvider {
            fragments: vec!["a", "bc", "", "d"],
        });
        let plain: Vec<String> = inner
            .open_stream(GenerationRequest::new("m", "p"))
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        let traced = TracedProvider::new(inner);
        let wrapped: Vec<String> = traced
            .open_stream(GenerationRequest::new("m", "p"))
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        assert_eq!(plain, wrapped);
        assert_eq!(traced.name(), "fixed");
    }

    #[tokio::test]
    async fn test_open_error_passes_through() {
        let traced = TracedProvider::new(Arc::new(DownProvider));
        let err = traced
            .open_stream(GenerationRequest::new("m", "p"))
            .await
            .err()
            .unwrap();
        assert!(err.is_unavailable());
    }
}
