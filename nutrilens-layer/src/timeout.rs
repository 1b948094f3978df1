//! Deadline for a single inference call.

use async_trait::async_trait;
use nutrilens_core::error::AnalysisError;
use nutrilens_core::layer::{Layer, LayeredProvider};
use nutrilens_core::provider::Provider;
use nutrilens_core::types::*;
use std::time::Duration;

/// Timeout layer configuration
#[derive(Debug, Clone)]
pub struct TimeoutLayer {
    timeout: Duration,
}

impl TimeoutLayer {
    /// Create a timeout layer with the given deadline
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// The configured deadline
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for TimeoutLayer {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

impl<P: Provider> Layer<P> for TimeoutLayer {
    type LayeredProvider = TimeoutProvider<P>;

    fn layer(&self, inner: P) -> Self::LayeredProvider {
        TimeoutProvider {
            inner,
            timeout: self.timeout,
        }
    }
}

/// Provider wrapped with a deadline
#[derive(Debug)]
pub struct TimeoutProvider<P> {
    inner: P,
    timeout: Duration,
}

#[async_trait]
impl<P: Provider> LayeredProvider for TimeoutProvider<P> {
    type Inner = P;

    fn inner(&self) -> &Self::Inner {
        &self.inner
    }

    async fn layered_generate(
        &self,
        req: InferenceRequest,
    ) -> Result<InferenceResponse, AnalysisError> {
        match tokio::time::timeout(self.timeout, self.inner.generate(req)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("inference call exceeded {:?}", self.timeout);
                Err(AnalysisError::timeout(format!(
                    "no response within {:?}",
                    self.timeout
                )))
            }
        }
    }
}

nutrilens_core::impl_layered_provider!(TimeoutProvider<P>);
