//! Strategy layer for provider-specific behaviors.
//!
//! Providers differ in how they accept an output schema (enforced JSON
//! Schema vs a plain JSON object mode); strategies hide that difference.

pub mod json_output;

pub use json_output::{detect_json_strategy, JsonModeStrategy, JsonOutputStrategy, JsonSchemaStrategy};
