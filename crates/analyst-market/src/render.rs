//! Incremental rendering of a fragment stream
//!
//! [`Accumulator`] is the fold; [`render`] drives it from a live stream and
//! overwrites a [`TextSurface`] with the cumulative text after every fragment.

use crate::error::{AnalystError, Result};
use analyst_llm::FragmentStream;
use futures::StreamExt;
use tracing::debug;

/// A display area that is overwritten with the full text on every update
pub trait TextSurface {
    /// Replace the area with `text` while streaming
    fn show(&mut self, text: &str) -> Result<()>;

    /// Replace the area with `text` in its final, non-streaming form
    fn finish(&mut self, text: &str) -> Result<()>;
}

/// Appends fragments in arrival order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accumulator {
    buffer: String,
    fragments: usize,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment and return the text so far
    pub fn push(&mut self, fragment: &str) -> &str {
        self.buffer.push_str(fragment);
        self.fragments += 1;
        &self.buffer
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn fragments(&self) -> usize {
        self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn into_text(self) -> String {
        self.buffer
    }
}

/// Iterator over the cumulative text after each fragment
#[derive(Debug, Clone)]
pub struct Prefixes<I> {
    fragments: I,
    acc: Accumulator,
}

impl<I, S> Iterator for Prefixes<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let fragment = self.fragments.next()?;
        Some(self.acc.push(fragment.as_ref()).to_string())
    }
}

/// What the surface shows after each of `fragments`
pub fn prefixes<I>(fragments: I) -> Prefixes<I::IntoIter>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    Prefixes {
        fragments: fragments.into_iter(),
        acc: Accumulator::new(),
    }
}

/// A completed render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub fragments: usize,
}

/// A render that stopped early; `partial` is what the surface last showed
#[derive(Debug)]
pub struct RenderFailure {
    pub partial: String,
    pub fragments: usize,
    pub error: AnalystError,
}

/// Consume `stream` once, overwriting `surface` after every fragment
///
/// The stream is dropped on every exit path, which releases its connection.
/// A stream error ends the render; what arrived before it stays on the surface.
pub async fn render<S>(mut stream: FragmentStream, surface: &mut S) -> std::result::Result<Rendered, RenderFailure>
where
    S: TextSurface + ?Sized,
{
    let mut acc = Accumulator::new();

    while let Some(item) = stream.next().await {
        let shown = match item {
            Ok(fragment) => surface.show(acc.push(&fragment)),
            Err(e) => Err(AnalystError::Generation(e)),
        };

        if let Err(error) = shown {
            if let Err(e) = surface.finish(acc.text()) {
                debug!(error = %e, "could not finalize partial output");
            }
            return Err(RenderFailure {
                fragments: acc.fragments(),
                partial: acc.into_text(),
                error,
            });
        }
    }

    surface.finish(acc.text()).map_err(|error| RenderFailure {
        partial: acc.text().to_string(),
        fragments: acc.fragments(),
        error,
    })?;

    Ok(Rendered {
        fragments: acc.fragments(),
        text: acc.into_text(),
    })
}
