//! Logging layer for inference calls.

use async_trait::async_trait;
use nutrilens_core::error::AnalysisError;
use nutrilens_core::layer::{Layer, LayeredProvider};
use nutrilens_core::provider::Provider;
use nutrilens_core::types::*;

/// Logging layer that logs each inference call.
///
/// Only sizes are logged; image bytes and prompt text never reach the log.
#[derive(Debug, Clone)]
pub struct LoggingLayer {
    prefix: String,
}

impl LoggingLayer {
    /// Create a new logging layer
    pub fn new() -> Self {
        Self {
            prefix: "[Nutrilens]".to_string(),
        }
    }

    /// Create a logging layer with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LoggingLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Provider> Layer<P> for LoggingLayer {
    type LayeredProvider = LoggingProvider<P>;

    fn layer(&self, inner: P) -> Self::LayeredProvider {
        LoggingProvider {
            inner,
            prefix: self.prefix.clone(),
        }
    }
}

/// Provider wrapped with logging
#[derive(Debug)]
pub struct LoggingProvider<P> {
    inner: P,
    prefix: String,
}

#[async_trait]
impl<P: Provider> LayeredProvider for LoggingProvider<P> {
    type Inner = P;

    fn inner(&self) -> &Self::Inner {
        &self.inner
    }

    async fn layered_generate(
        &self,
        req: InferenceRequest,
    ) -> Result<InferenceResponse, AnalysisError> {
        let images = req.parts.iter().filter(|p| p.is_inline_data()).count();
        tracing::debug!(
            "{} generate request: model={}, parts={}, images={}",
            self.prefix,
            req.model,
            req.parts.len(),
            images
        );

        let start = std::time::Instant::now();
        let result = self.inner.generate(req).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::debug!(
                    "{} generate success: id={}, finish={:?}, tokens={}, elapsed={:?}",
                    self.prefix,
                    response.id,
                    response.finish_reason,
                    response.usage.total_tokens,
                    elapsed
                );
            }
            Err(e) => {
                tracing::error!(
                    "{} generate error: {}, elapsed={:?}",
                    self.prefix,
                    e,
                    elapsed
                );
            }
        }

        result
    }
}

nutrilens_core::impl_layered_provider!(LoggingProvider<P>);
