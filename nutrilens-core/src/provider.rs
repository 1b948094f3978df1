//! Provider trait: the seam to the inference capability.

use crate::error::AnalysisError;
use crate::types::*;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

/// Core provider trait for inference capabilities.
///
/// A provider accepts an instruction, content parts and an optional output
/// format, and returns generated text or a transport error. Everything above
/// that (payload building, parsing, validation) lives in the runtime.
#[async_trait]
pub trait Provider: Send + Sync + Debug + 'static {
    /// Get provider information
    fn info(&self) -> Arc<ProviderInfo>;

    /// Single blocking generation call
    ///
    /// Failures of the call itself must be reported as
    /// [`AnalysisError::Transport`].
    async fn generate(&self, req: InferenceRequest) -> Result<InferenceResponse, AnalysisError>;
}

#[async_trait]
impl<P: Provider + ?Sized> Provider for Arc<P> {
    fn info(&self) -> Arc<ProviderInfo> {
        (**self).info()
    }

    async fn generate(&self, req: InferenceRequest) -> Result<InferenceResponse, AnalysisError> {
        (**self).generate(req).await
    }
}

#[async_trait]
impl<P: Provider + ?Sized> Provider for Box<P> {
    fn info(&self) -> Arc<ProviderInfo> {
        (**self).info()
    }

    async fn generate(&self, req: InferenceRequest) -> Result<InferenceResponse, AnalysisError> {
        (**self).generate(req).await
    }
}
