//! # Nutrilens Core
//!
//! The analysis request/response contract: how an image, a free-text
//! description, or both become a validated [`NutritionRecord`].
//!
//! This crate provides the data model, the request builder, the result
//! extractor, the output schema, configuration, the error taxonomy and the
//! traits providers and layers implement.

pub mod config;
pub mod error;
pub mod extract;
pub mod input;
pub mod layer;
pub mod provider;
pub mod record;
pub mod request;
pub mod runtime;
pub mod schema;
pub mod strategy;
pub mod types;

// Re-exports
pub use config::{AnalyzerConfig, ProviderKind};
pub use error::{AnalysisError, FailureKind, TransportCause};
pub use extract::{parse_record, ResultExtractor};
pub use input::{AnalysisInput, ImageInput};
pub use layer::{Layer, LayeredProvider};
pub use provider::Provider;
pub use record::{HealthRating, MacroShare, Macros, Micronutrient, NutritionRecord, ProcessingLevel};
pub use request::RequestBuilder;
pub use runtime::{AnalysisState, Analyzer, AnalyzerBuilder};
pub use schema::OutputSchema;
pub use strategy::{JsonModeStrategy, JsonOutputStrategy, JsonSchemaStrategy};
pub use types::*;

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;
