//! # Nutrilens
//!
//! Nutritional analysis of a food item from a photo, a free-text
//! description, or both, using a vision-capable language model.
//!
//! Every analysis is a single stateless request: the input is wrapped in a
//! Brazilian-Portuguese nutritionist prompt, sent once with a strict output
//! schema, and the reply is parsed and validated into a [`NutritionRecord`].
//! Nothing is retried, cached, or repaired.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! nutrilens = { version = "0.1", features = ["gemini", "layers"] }
//! ```
//!
//! ```ignore
//! use nutrilens::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AnalyzerConfig::from_env()?;
//! let analyzer = nutrilens::analyzer_from_config(&config)?;
//!
//! let record = nutrilens::analyze_food(&analyzer, None, Some("Um prato de arroz com feijão")).await?;
//! println!("{} ({} kcal)", record.food_name, record.calories);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: `gemini`, `openai` and `layers`
//! - `gemini` / `openai`: one provider implementation each
//! - `providers`: both providers
//! - `layers`: logging and timeout layers
//! - `schema`: re-export `schemars`
//! - `full`: All features enabled

// Re-export core types and traits
pub use nutrilens_core::*;

// Re-export providers under `provider` module
#[cfg(feature = "nutrilens-provider")]
pub mod provider {
    //! Inference provider implementations.
    pub use nutrilens_provider::*;
}

// Re-export layers under `layer` module
#[cfg(feature = "nutrilens-layer")]
pub mod layer {
    //! Built-in provider layers.
    pub use nutrilens_layer::*;
}

// Re-export schemars when schema feature is enabled
#[cfg(feature = "schema")]
pub mod schemars {
    pub use ::schemars::*;
}

/// Analyse one food item from an optional base64 image and an optional
/// text query.
///
/// The image may carry a `data:image/...;base64,` header. Blank inputs count
/// as absent; if both are absent this fails with a precondition error and
/// the provider is never called.
pub async fn analyze_food(
    analyzer: &Analyzer,
    image_base64: Option<&str>,
    text_query: Option<&str>,
) -> Result<NutritionRecord> {
    analyzer.analyze_food(image_base64, text_query).await
}

/// Build an analyzer from configuration.
///
/// The provider is wrapped in a [`layer::TimeoutLayer`] bounded by
/// `config.timeout` and a [`layer::LoggingLayer`].
#[cfg(all(feature = "nutrilens-provider", feature = "nutrilens-layer"))]
pub fn analyzer_from_config(config: &AnalyzerConfig) -> Result<Analyzer> {
    let provider = provider::ConfiguredProvider::from_config(config)?;

    let mut builder = Analyzer::builder(provider)
        .layer(layer::TimeoutLayer::new(config.timeout))
        .layer(layer::LoggingLayer::new())
        .model(config.model.clone());
    if let Some(temperature) = config.temperature {
        builder = builder.temperature(temperature);
    }

    builder.finish()
}

/// Prelude module for convenient imports
pub mod prelude {
    //! Prelude module containing the most commonly used types and traits.
    //!
    //! ```
    //! use nutrilens::prelude::*;
    //! ```

    pub use crate::{
        AnalysisError, AnalysisInput, Analyzer, AnalyzerConfig, FailureKind, HealthRating,
        ImageInput, Layer, NutritionRecord, ProcessingLevel, Provider, ProviderKind, Result,
        TransportCause,
    };

    #[cfg(feature = "nutrilens-provider")]
    pub use crate::provider::*;

    #[cfg(feature = "nutrilens-layer")]
    pub use crate::layer::*;
}
