//! Analyzer implementation.
//!
//! The analyzer runs one stateless request per call: build the payload, make
//! a single inference call, extract the record. It holds no cross-request
//! state, so one instance can serve any number of concurrent analyses.

use crate::error::AnalysisError;
use crate::extract::ResultExtractor;
use crate::input::AnalysisInput;
use crate::layer::Layer;
use crate::provider::Provider;
use crate::record::NutritionRecord;
use crate::request::RequestBuilder;
use crate::runtime::state::{AnalysisState, Lifecycle};
use crate::schema::OutputSchema;
use crate::strategy::{detect_json_strategy, JsonOutputStrategy};
use crate::types::*;
use std::sync::Arc;
use tracing::Instrument;

/// Type-erased provider that can be shared across threads
type BoxedProvider = Arc<dyn Provider>;

/// Builder for composing an analyzer from a provider and layers.
///
/// # Example
///
/// ```ignore
/// let analyzer = Analyzer::builder(gemini_provider)
///     .layer(LoggingLayer::new())
///     .layer(TimeoutLayer::new(Duration::from_secs(60)))
///     .model("gemini-3-pro-preview")
///     .finish()?;
/// ```
pub struct AnalyzerBuilder<P> {
    provider: P,
    model: Option<String>,
    temperature: Option<f32>,
    json_strategy: Option<Box<dyn JsonOutputStrategy>>,
}

impl<P: Provider> AnalyzerBuilder<P> {
    /// Create a new builder with a provider
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            model: None,
            temperature: None,
            json_strategy: None,
        }
    }

    /// Add a layer to wrap the provider
    ///
    /// Each call wraps the previous provider in a new concrete type.
    pub fn layer<L>(self, layer: L) -> AnalyzerBuilder<L::LayeredProvider>
    where
        L: Layer<P>,
    {
        AnalyzerBuilder {
            provider: layer.layer(self.provider),
            model: self.model,
            temperature: self.temperature,
            json_strategy: self.json_strategy,
        }
    }

    /// Set the model identifier
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the sampling temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set a custom JSON output strategy
    ///
    /// If not set, the strategy is picked from the provider id.
    pub fn json_strategy(mut self, strategy: Box<dyn JsonOutputStrategy>) -> Self {
        self.json_strategy = Some(strategy);
        self
    }

    /// Finish building.
    ///
    /// Compiles the output schema and checks the model eagerly so that no
    /// configuration problem surfaces mid-request.
    pub fn finish(self) -> Result<Analyzer, AnalysisError> {
        let model = self
            .model
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| AnalysisError::configuration("model is required"))?;
        let schema = OutputSchema::nutrition()?;

        let provider: BoxedProvider = Arc::new(self.provider);
        let json_strategy = self
            .json_strategy
            .unwrap_or_else(|| detect_json_strategy(&provider.info().id));

        Ok(Analyzer {
            provider,
            json_strategy,
            model,
            temperature: self.temperature,
            schema,
        })
    }
}

/// Entry point for food analysis.
pub struct Analyzer {
    provider: BoxedProvider,
    json_strategy: Box<dyn JsonOutputStrategy>,
    model: String,
    temperature: Option<f32>,
    schema: &'static OutputSchema,
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("provider", &self.provider)
            .field("json_strategy", &self.json_strategy.name())
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl Analyzer {
    /// Create a new builder
    pub fn builder<P: Provider>(provider: P) -> AnalyzerBuilder<P> {
        AnalyzerBuilder::new(provider)
    }

    /// Get provider information
    pub fn info(&self) -> Arc<ProviderInfo> {
        self.provider.info()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    /// Build the content payload for an input without sending it
    pub fn build_payload(&self, input: &AnalysisInput) -> Result<ContentPayload, AnalysisError> {
        RequestBuilder::new(self.schema).build(input)
    }

    /// Analyse one food item.
    pub async fn analyze(&self, input: &AnalysisInput) -> Result<NutritionRecord, AnalysisError> {
        let ctx = RequestContext::new(self.provider.info().id.clone(), self.model.clone());
        let span = tracing::info_span!(
            "analysis",
            request_id = %ctx.request_id,
            provider = %ctx.provider_id,
            model = %ctx.model
        );

        self.run(input).instrument(span).await
    }

    /// Analyse from an optional base64 image (data-URI headers allowed) and
    /// an optional text query.
    pub async fn analyze_food(
        &self,
        image_base64: Option<&str>,
        text_query: Option<&str>,
    ) -> Result<NutritionRecord, AnalysisError> {
        self.analyze(&AnalysisInput::from_parts(image_base64, text_query))
            .await
    }

    async fn run(&self, input: &AnalysisInput) -> Result<NutritionRecord, AnalysisError> {
        let mut lifecycle = Lifecycle::new();

        lifecycle.advance(AnalysisState::Building);
        let payload = match self.build_payload(input) {
            Ok(payload) => payload,
            Err(err) => {
                lifecycle.advance(AnalysisState::Failed(err.kind()));
                tracing::warn!("analysis rejected before sending: {}", err);
                return Err(err);
            }
        };

        lifecycle.advance(AnalysisState::AwaitingResponse);
        let extractor = ResultExtractor::new(
            self.provider.as_ref(),
            self.json_strategy.as_ref(),
            &self.model,
        )
        .with_temperature(self.temperature);

        match extractor.extract(&payload, self.schema).await {
            Ok(record) => {
                lifecycle.advance(AnalysisState::Success);
                tracing::info!(
                    "analysis complete: food={}, calories={}, health_score={}",
                    record.food_name,
                    record.calories,
                    record.health_score
                );
                Ok(record)
            }
            Err(err) => {
                lifecycle.advance(AnalysisState::Failed(err.kind()));
                tracing::error!("analysis failed: {}", err);
                Err(err)
            }
        }
    }
}
