//! Result extractor: one inference call, then parse and validate.

use crate::error::AnalysisError;
use crate::provider::Provider;
use crate::record::NutritionRecord;
use crate::schema::OutputSchema;
use crate::strategy::JsonOutputStrategy;
use crate::types::{ContentPayload, FinishReason, InferenceRequest, InferenceResponse};

/// Longest excerpt of raw model output quoted in error messages
const EXCERPT_LEN: usize = 200;

/// Sends a payload to the inference capability and turns the answer into a
/// [`NutritionRecord`].
pub struct ResultExtractor<'a> {
    provider: &'a dyn Provider,
    strategy: &'a dyn JsonOutputStrategy,
    model: &'a str,
    temperature: Option<f32>,
}

impl<'a> ResultExtractor<'a> {
    pub fn new(
        provider: &'a dyn Provider,
        strategy: &'a dyn JsonOutputStrategy,
        model: &'a str,
    ) -> Self {
        Self {
            provider,
            strategy,
            model,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Build the inference request for a payload
    pub fn request_for(&self, payload: &ContentPayload) -> Result<InferenceRequest, AnalysisError> {
        let mut req = InferenceRequest::from_payload(self.model, payload);
        req.temperature = self.temperature;
        self.strategy.apply(&mut req, &payload.schema)?;
        Ok(req)
    }

    /// Perform the single inference call and extract the record.
    ///
    /// Malformed or empty output is final; nothing is retried.
    pub async fn extract(
        &self,
        payload: &ContentPayload,
        schema: &OutputSchema,
    ) -> Result<NutritionRecord, AnalysisError> {
        let req = self.request_for(payload)?;

        tracing::debug!(
            "extract: strategy={}, model={}, parts={}",
            self.strategy.name(),
            req.model,
            req.parts.len()
        );

        let response = self.provider.generate(req).await?;
        extract_response(&response, schema)
    }
}

/// Classify a raw provider response.
pub fn extract_response(
    response: &InferenceResponse,
    schema: &OutputSchema,
) -> Result<NutritionRecord, AnalysisError> {
    match parse_record(response.text.as_deref(), schema) {
        Err(AnalysisError::MalformedResponse(reason))
            if response.finish_reason == FinishReason::Length =>
        {
            Err(AnalysisError::malformed(format!(
                "{} (output was truncated at the token limit)",
                reason
            )))
        }
        other => other,
    }
}

/// Parse raw model text into a validated record.
///
/// Absent or blank text is [`AnalysisError::EmptyResponse`]; anything that
/// is not JSON, violates the schema or fails to map onto the record type is
/// [`AnalysisError::MalformedResponse`]. Values are never clamped or
/// defaulted beyond what the schema declares optional.
pub fn parse_record(
    text: Option<&str>,
    schema: &OutputSchema,
) -> Result<NutritionRecord, AnalysisError> {
    let text = match text.map(str::trim) {
        Some(text) if !text.is_empty() => text,
        _ => return Err(AnalysisError::EmptyResponse),
    };

    let value: serde_json::Value = serde_json::from_str(text).map_err(|e| {
        AnalysisError::malformed(format!(
            "response is not valid JSON ({}): {}",
            e,
            excerpt(text)
        ))
    })?;

    schema.validate(&value).map_err(|errors| {
        AnalysisError::malformed(format!("response violates schema: {}", errors.join("; ")))
    })?;

    serde_json::from_value(value)
        .map_err(|e| AnalysisError::malformed(format!("response does not fit record: {}", e)))
}

fn excerpt(text: &str) -> String {
    match text.char_indices().nth(EXCERPT_LEN) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
