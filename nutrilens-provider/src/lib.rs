//! # Nutrilens Providers
//!
//! Vision-capable inference providers: Google Gemini over its REST API and
//! any OpenAI-compatible chat completion endpoint.
//!
//! Each provider sits behind a feature of the same name (`gemini`,
//! `openai`); both are on by default. Neither provider re-sends a failed
//! request.

#[cfg(not(any(feature = "gemini", feature = "openai")))]
compile_error!("enable at least one of the `gemini` or `openai` features");

#[cfg(feature = "gemini")]
pub mod gemini;
#[cfg(feature = "openai")]
pub mod openai;

#[cfg(test)]
mod stub;

// Re-exports
#[cfg(feature = "gemini")]
pub use gemini::{to_gemini_schema, GeminiBuilder, GeminiProvider};
#[cfg(feature = "openai")]
pub use openai::{OpenAiBuilder, OpenAiProvider};

use async_trait::async_trait;
use nutrilens_core::config::{AnalyzerConfig, ProviderKind};
use nutrilens_core::error::AnalysisError;
use nutrilens_core::provider::Provider;
use nutrilens_core::types::{InferenceRequest, InferenceResponse, ProviderInfo};
use std::sync::Arc;

/// A provider chosen at runtime from configuration.
#[derive(Debug, Clone)]
pub enum ConfiguredProvider {
    #[cfg(feature = "gemini")]
    Gemini(GeminiProvider),
    #[cfg(feature = "openai")]
    OpenAi(OpenAiProvider),
}

impl ConfiguredProvider {
    /// Build the provider named by `config`.
    ///
    /// The configuration is validated first, so a blank key never reaches
    /// the network. `config.timeout` bounds every HTTP call.
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self, AnalysisError> {
        config.validate()?;

        match config.provider {
            #[cfg(feature = "gemini")]
            ProviderKind::Gemini => {
                let mut builder = GeminiProvider::builder()
                    .api_key(config.api_key.clone())
                    .timeout(config.timeout);
                if let Some(api_base) = &config.api_base {
                    builder = builder.api_base(api_base.clone());
                }
                Ok(Self::Gemini(builder.build()?))
            }
            #[cfg(feature = "openai")]
            ProviderKind::OpenAi => {
                let mut builder = OpenAiProvider::builder()
                    .api_key(config.api_key.clone())
                    .timeout(config.timeout);
                if let Some(api_base) = &config.api_base {
                    builder = builder.api_base(api_base.clone());
                }
                Ok(Self::OpenAi(builder.build()?))
            }
            #[allow(unreachable_patterns)]
            other => Err(AnalysisError::configuration(format!(
                "provider '{}' is not enabled in this build",
                other.id()
            ))),
        }
    }
}

#[async_trait]
impl Provider for ConfiguredProvider {
    fn info(&self) -> Arc<ProviderInfo> {
        match self {
            #[cfg(feature = "gemini")]
            Self::Gemini(p) => p.info(),
            #[cfg(feature = "openai")]
            Self::OpenAi(p) => p.info(),
        }
    }

    async fn generate(&self, req: InferenceRequest) -> Result<InferenceResponse, AnalysisError> {
        match self {
            #[cfg(feature = "gemini")]
            Self::Gemini(p) => p.generate(req).await,
            #[cfg(feature = "openai")]
            Self::OpenAi(p) => p.generate(req).await,
        }
    }
}

#[cfg(all(test, feature = "gemini", feature = "openai"))]
mod tests {
    use super::*;
    use crate::stub::{Reply, StubServer};
    use nutrilens_core::error::{FailureKind, TransportCause};
    use nutrilens_core::types::ContentPart;
    use std::time::Duration;

    #[test]
    fn test_from_config_selects_provider() {
        let gemini = ConfiguredProvider::from_config(&AnalyzerConfig::new(
            ProviderKind::Gemini,
            "key",
        ))
        .unwrap();
        assert_eq!(gemini.info().id, "gemini");

        let openai = ConfiguredProvider::from_config(
            &AnalyzerConfig::new(ProviderKind::OpenAi, "key")
                .with_api_base("http://localhost:8080/v1"),
        )
        .unwrap();
        assert_eq!(openai.info().id, "openai");
    }

    #[tokio::test]
    async fn test_config_timeout_applies_to_every_provider() {
        let server = StubServer::start(Reply::Silent).await;

        for (kind, base) in [
            (ProviderKind::Gemini, server.base.clone()),
            (ProviderKind::OpenAi, format!("{}/v1", server.base)),
        ] {
            let config = AnalyzerConfig::new(kind, "key")
                .with_api_base(base)
                .with_timeout(Duration::from_millis(200));
            let provider = ConfiguredProvider::from_config(&config).unwrap();

            let err = tokio::time::timeout(
                Duration::from_secs(5),
                provider.generate(InferenceRequest::new("m", vec![ContentPart::text("ovo")])),
            )
            .await
            .unwrap_or_else(|_| panic!("{:?} ignored the configured timeout", kind))
            .unwrap_err();

            assert_eq!(err.transport_cause(), Some(TransportCause::Timeout), "{:?}", kind);
        }
    }

    #[test]
    fn test_from_config_rejects_blank_key() {
        let err = ConfiguredProvider::from_config(&AnalyzerConfig::new(ProviderKind::Gemini, "  "))
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Configuration);
    }
}
