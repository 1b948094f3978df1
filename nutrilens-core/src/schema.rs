//! Output schema as data.
//!
//! The canonical schema is a draft 2020-12 JSON Schema generated from
//! [`NutritionRecord`]. Providers translate it to their own wire dialect;
//! validation always runs against the canonical form.

use crate::error::AnalysisError;
use crate::record::NutritionRecord;
use jsonschema::Validator;
use serde_json::Value;
use std::sync::OnceLock;

/// Fields every record must carry.
pub const REQUIRED_FIELDS: [&str; 11] = [
    "foodName",
    "calories",
    "macros",
    "healthScore",
    "description",
    "pros",
    "cons",
    "tips",
    "processingLevel",
    "allergens",
    "estimatedWeight",
];

/// Canonical output schema with its compiled validator.
pub struct OutputSchema {
    value: Value,
    validator: Validator,
}

impl std::fmt::Debug for OutputSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputSchema")
            .field("value", &self.value)
            .finish()
    }
}

impl OutputSchema {
    /// Compile a schema from a JSON value
    pub fn new(value: Value) -> Result<Self, AnalysisError> {
        let validator = Validator::new(&value)
            .map_err(|e| AnalysisError::configuration(format!("Invalid output schema: {}", e)))?;
        Ok(Self { value, validator })
    }

    /// The nutrition record schema, generated and compiled once per process
    pub fn nutrition() -> Result<&'static OutputSchema, AnalysisError> {
        static SCHEMA: OnceLock<Result<OutputSchema, String>> = OnceLock::new();

        SCHEMA
            .get_or_init(|| {
                let schema = schemars::schema_for!(NutritionRecord);
                let value = serde_json::to_value(&schema).map_err(|e| e.to_string())?;
                OutputSchema::new(value).map_err(|e| e.to_string())
            })
            .as_ref()
            .map_err(|e| AnalysisError::configuration(e.clone()))
    }

    /// The schema as a JSON value
    pub fn as_value(&self) -> &Value {
        &self.value
    }

    /// Top-level required property names, in schema order
    pub fn required_fields(&self) -> Vec<&str> {
        self.value
            .get("required")
            .and_then(Value::as_array)
            .map(|fields| fields.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Validate an instance, collecting every violation with its path
    pub fn validate(&self, instance: &Value) -> Result<(), Vec<String>> {
        let errors: Vec<String> = self
            .validator
            .iter_errors(instance)
            .map(|error| format!("at '{}': {}", error.instance_path, error))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
