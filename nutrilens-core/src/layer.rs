//! Layer trait and abstractions.
//!
//! Layers wrap a provider with cross-cutting concerns such as logging or a
//! deadline on the inference call, and are themselves providers.

use crate::error::AnalysisError;
use crate::provider::Provider;
use crate::types::*;
use async_trait::async_trait;
use std::sync::Arc;

/// Layer trait for wrapping providers.
///
/// Each layer wraps an inner provider and returns a new provider with
/// enhanced capabilities.
pub trait Layer<P: Provider> {
    /// The type of the layered provider
    type LayeredProvider: Provider;

    /// Wrap the inner provider with this layer
    fn layer(&self, inner: P) -> Self::LayeredProvider;
}

/// Helper trait for layered providers.
///
/// Provides forwarding defaults; implementers only override what they
/// intercept.
#[async_trait]
pub trait LayeredProvider: Sized + Provider {
    /// The inner provider type
    type Inner: Provider;

    /// Get a reference to the inner provider
    fn inner(&self) -> &Self::Inner;

    /// Default implementation for info - forwards to inner
    fn layered_info(&self) -> Arc<ProviderInfo> {
        self.inner().info()
    }

    /// Default implementation for generate - forwards to inner
    async fn layered_generate(
        &self,
        req: InferenceRequest,
    ) -> Result<InferenceResponse, AnalysisError> {
        self.inner().generate(req).await
    }
}

/// Implement [`Provider`] for a type by forwarding to its
/// [`LayeredProvider`] methods.
#[macro_export]
macro_rules! impl_layered_provider {
    ($type:ident < $param:ident >) => {
        #[async_trait::async_trait]
        impl<$param: $crate::provider::Provider> $crate::provider::Provider for $type<$param> {
            fn info(&self) -> std::sync::Arc<$crate::types::ProviderInfo> {
                $crate::layer::LayeredProvider::layered_info(self)
            }

            async fn generate(
                &self,
                req: $crate::types::InferenceRequest,
            ) -> Result<$crate::types::InferenceResponse, $crate::error::AnalysisError> {
                $crate::layer::LayeredProvider::layered_generate(self, req).await
            }
        }
    };
}
