//! Documentation synthesis
//!
//! The [`Generator`] trait is the seam to whatever produces docstring text.
//! [`synthesize`] drives one call and normalises the response.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use thiserror::Error;
use tracing::{debug, warn};

use crate::DocKind;

/// Errors a generator can report for a single request.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("generator service error ({status}): {message}")]
    Service { status: u16, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("response stream ended before completion")]
    IncompleteStream,
}

/// A generator response: either the full text or chunks in arrival order.
pub enum Generation {
    Complete(String),
    Stream(BoxStream<'static, Result<String, GeneratorError>>),
}

impl std::fmt::Debug for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Generation::Complete(text) => f.debug_tuple("Complete").field(text).finish(),
            Generation::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl Generation {
    /// Buffer the whole response. Any chunk error fails the generation.
    pub async fn collect(self) -> Result<String, GeneratorError> {
        match self {
            Generation::Complete(text) => Ok(text),
            Generation::Stream(mut chunks) => {
                let mut text = String::new();
                while let Some(chunk) = chunks.next().await {
                    text.push_str(&chunk?);
                }
                Ok(text)
            }
        }
    }
}

/// Produces a natural-language description for a code fragment.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, fragment: &str, kind: DocKind) -> Result<Generation, GeneratorError>;
}

/// Ask `generator` for a docstring. `None` means no usable text was
/// produced; the reason has already been logged.
pub async fn synthesize(generator: &dyn Generator, fragment: &str, kind: DocKind) -> Option<String> {
    let response = match generator.generate(fragment, kind).await {
        Ok(generation) => generation.collect().await,
        Err(e) => Err(e),
    };

    match response {
        Ok(raw) => {
            let cleaned = clean_response(&raw);
            if cleaned.is_none() {
                warn!(%kind, "generator returned no usable text");
            }
            cleaned
        }
        Err(e) => {
            warn!(%kind, error = %e, "docstring generation failed");
            None
        }
    }
}

/// Normalise raw generator output into docstring text.
///
/// Signature lines echoed by the model are dropped and one surrounding
/// quote character is removed from each end.
pub fn clean_response(raw: &str) -> Option<String> {
    let kept: Vec<&str> = raw
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !(trimmed.starts_with("def ") || trimmed.starts_with("class "))
        })
        .collect();
    let joined = kept.join("\n");

    let is_quote = |c: char| c == '"' || c == '\'';
    let text = joined.trim();
    let text = text.strip_prefix(is_quote).unwrap_or(text);
    let text = text.strip_suffix(is_quote).unwrap_or(text);

    if text.trim().is_empty() {
        debug!("discarding empty generator response");
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    struct Fixed(Result<&'static str, ()>);

    #[async_trait]
    impl Generator for Fixed {
        async fn generate(&self, _fragment: &str, _kind: DocKind) -> Result<Generation, GeneratorError> {
            match self.0 {
                Ok(text) => Ok(Generation::Complete(text.to_string())),
                Err(()) => Err(GeneratorError::Transport("connection refused".to_string())),
            }
        }
    }

    struct Chunked(Vec<Result<&'static str, ()>>);

    #[async_trait]
    impl Generator for Chunked {
        async fn generate(&self, _fragment: &str, _kind: DocKind) -> Result<Generation, GeneratorError> {
            let chunks: Vec<Result<String, GeneratorError>> = self
                .0
                .iter()
                .map(|c| match c {
                    Ok(text) => Ok(text.to_string()),
                    Err(()) => Err(GeneratorError::IncompleteStream),
                })
                .collect();
            Ok(Generation::Stream(stream::iter(chunks).boxed()))
        }
    }

    #[test]
    fn test_clean_response_drops_signature_lines() {
        let raw = "def add(a, b):\nAdd two numbers.\n\n    class Foo:\nArgs:\n    a: first";
        assert_eq!(
            clean_response(raw).as_deref(),
            Some("Add two numbers.\n\nArgs:\n    a: first")
        );
    }

    #[test]
    fn test_clean_response_strips_one_quote_each_side() {
        assert_eq!(clean_response("\"Summary.\"").as_deref(), Some("Summary."));
        assert_eq!(clean_response("'Summary.").as_deref(), Some("Summary."));
        assert_eq!(clean_response("\"\"\"Summary.\"\"\"").as_deref(), Some("\"\"Summary.\"\""));
        assert_eq!(clean_response("  \n\"\"  "), None);
        assert_eq!(clean_response("def f(x):"), None);
    }

    #[tokio::test]
    async fn test_synthesize_complete() {
        let generator = Fixed(Ok("  Return x incremented.\n"));
        let text = synthesize(&generator, "def f(x): ...", DocKind::Function).await;
        assert_eq!(text.as_deref(), Some("Return x incremented."));
    }

    #[tokio::test]
    async fn test_synthesize_transport_failure() {
        let generator = Fixed(Err(()));
        assert_eq!(synthesize(&generator, "def f(): ...", DocKind::Function).await, None);
    }

    #[tokio::test]
    async fn test_synthesize_stream_buffers_in_order() {
        let generator = Chunked(vec![Ok("Builds "), Ok("a "), Ok("widget.")]);
        let text = synthesize(&generator, "class W: pass", DocKind::Class).await;
        assert_eq!(text.as_deref(), Some("Builds a widget."));
    }

    #[tokio::test]
    async fn test_synthesize_broken_stream_fails() {
        let generator = Chunked(vec![Ok("Builds "), Err(())]);
        assert_eq!(synthesize(&generator, "class W: pass", DocKind::Class).await, None);
    }
}
