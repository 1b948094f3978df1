//! JSON output strategies for different providers.
//!
//! - JsonSchemaStrategy: providers that enforce a response schema natively (Gemini, OpenAI)
//! - JsonModeStrategy: providers that only offer a basic JSON object mode

use crate::error::AnalysisError;
use crate::types::{ContentPart, InferenceRequest, ResponseFormat};

/// Strategy for requesting schema-constrained output.
pub trait JsonOutputStrategy: Send + Sync {
    /// Get the strategy name for debugging
    fn name(&self) -> &str;

    /// Apply this strategy to a request so the capability answers with JSON
    /// matching `schema`.
    fn apply(
        &self,
        req: &mut InferenceRequest,
        schema: &serde_json::Value,
    ) -> Result<(), AnalysisError>;
}

/// JSON Schema strategy for providers that enforce a response schema.
#[derive(Debug, Clone)]
pub struct JsonSchemaStrategy {
    /// Whether to enable strict mode
    pub strict: bool,
}

impl JsonSchemaStrategy {
    /// Create a new JSON Schema strategy with strict mode enabled
    pub fn new() -> Self {
        Self { strict: true }
    }

    /// Create a new JSON Schema strategy with configurable strict mode
    pub fn with_strict(strict: bool) -> Self {
        Self { strict }
    }
}

impl Default for JsonSchemaStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonOutputStrategy for JsonSchemaStrategy {
    fn name(&self) -> &str {
        "JsonSchemaStrategy"
    }

    fn apply(
        &self,
        req: &mut InferenceRequest,
        schema: &serde_json::Value,
    ) -> Result<(), AnalysisError> {
        req.response_format = Some(ResponseFormat::JsonSchema {
            name: "nutrition_record".to_string(),
            schema: schema.clone(),
            strict: self.strict,
        });

        Ok(())
    }
}

/// JSON Mode strategy for providers without schema enforcement.
///
/// Sets the response format to a plain JSON object and spells the schema out
/// in the prompt.
#[derive(Debug, Clone)]
pub struct JsonModeStrategy {
    /// Append the schema to the system instruction (true) or as a trailing text part (false)
    pub use_system_instruction: bool,
}

impl JsonModeStrategy {
    /// Create a new JSON Mode strategy that extends the system instruction
    pub fn new() -> Self {
        Self {
            use_system_instruction: true,
        }
    }

    /// Create a new JSON Mode strategy with configurable injection point
    pub fn with_system_instruction(use_system_instruction: bool) -> Self {
        Self {
            use_system_instruction,
        }
    }

    /// Build a JSON instruction from a schema
    fn build_json_instruction(schema: &serde_json::Value) -> Result<String, AnalysisError> {
        let schema_str = serde_json::to_string_pretty(schema)
            .map_err(|e| AnalysisError::configuration(format!("Unserializable schema: {}", e)))?;
        Ok(format!(
            "Responda apenas com JSON válido que siga este schema:\n```json\n{}\n```\n\n\
            1. Retorne somente o objeto JSON, sem texto adicional\n\
            2. Inclua todos os campos obrigatórios\n\
            3. Use os tipos de dados corretos em cada campo",
            schema_str
        ))
    }
}

impl Default for JsonModeStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonOutputStrategy for JsonModeStrategy {
    fn name(&self) -> &str {
        "JsonModeStrategy"
    }

    fn apply(
        &self,
        req: &mut InferenceRequest,
        schema: &serde_json::Value,
    ) -> Result<(), AnalysisError> {
        req.response_format = Some(ResponseFormat::JsonObject);

        let instruction = Self::build_json_instruction(schema)?;

        if self.use_system_instruction {
            req.system_instruction = Some(match req.system_instruction.take() {
                Some(existing) => format!("{}\n\n{}", existing, instruction),
                None => instruction,
            });
        } else {
            req.parts.push(ContentPart::Text { text: instruction });
        }

        Ok(())
    }
}

/// Pick the JSON output strategy for a provider id.
pub fn detect_json_strategy(provider_id: &str) -> Box<dyn JsonOutputStrategy> {
    match provider_id {
        "gemini" => Box::new(JsonSchemaStrategy::new()),

        // OpenAI strict mode rejects optional properties
        "openai" | "azure" => Box::new(JsonSchemaStrategy::with_strict(false)),

        // Unknown providers get plain JSON mode
        _ => Box::new(JsonModeStrategy::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "foodName": {"type": "string"}
            }
        })
    }

    #[test]
    fn test_json_schema_strategy() {
        let strategy = JsonSchemaStrategy::new();
        let mut req = InferenceRequest::new("test-model", vec![]);

        strategy.apply(&mut req, &schema()).unwrap();

        match req.response_format {
            Some(ResponseFormat::JsonSchema {
                name: _,
                schema: s,
                strict,
            }) => {
                assert_eq!(s, schema());
                assert!(strict);
            }
            _ => panic!("Expected JsonSchema response format"),
        }
    }

    #[test]
    fn test_json_mode_strategy_extends_system_instruction() {
        let strategy = JsonModeStrategy::new();
        let mut req = InferenceRequest::new("test-model", vec![ContentPart::text("maçã")])
            .with_system_instruction("Você é um nutricionista.");

        strategy.apply(&mut req, &schema()).unwrap();

        assert!(matches!(req.response_format, Some(ResponseFormat::JsonObject)));
        let instruction = req.system_instruction.unwrap();
        assert!(instruction.starts_with("Você é um nutricionista."));
        assert!(instruction.contains("\"foodName\""));
        assert_eq!(req.parts.len(), 1);
    }

    #[test]
    fn test_json_mode_strategy_trailing_part() {
        let strategy = JsonModeStrategy::with_system_instruction(false);
        let mut req = InferenceRequest::new("test-model", vec![ContentPart::text("maçã")]);

        strategy.apply(&mut req, &schema()).unwrap();

        assert!(req.system_instruction.is_none());
        assert_eq!(req.parts.len(), 2);
        assert!(req.parts[1].as_text().unwrap().contains("\"foodName\""));
    }

    #[test]
    fn test_detect_json_strategy() {
        assert_eq!(detect_json_strategy("gemini").name(), "JsonSchemaStrategy");
        assert_eq!(detect_json_strategy("openai").name(), "JsonSchemaStrategy");
        assert_eq!(detect_json_strategy("unknown").name(), "JsonModeStrategy");
    }
}
