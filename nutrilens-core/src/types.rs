//! Core types exchanged with the inference capability.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One unit of input to the inference capability
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text {
        text: String,
    },
    /// Inline binary content, base64 encoded without any data-URI header
    InlineData {
        mime_type: String,
        data: String,
    },
}

impl ContentPart {
    /// Create a text part
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create an inline binary part
    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self::InlineData {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Text content, if this is a text part
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentPart::Text { text } => Some(text),
            ContentPart::InlineData { .. } => None,
        }
    }

    pub fn is_inline_data(&self) -> bool {
        matches!(self, ContentPart::InlineData { .. })
    }
}

/// Everything the Request Builder produces for a single analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentPayload {
    /// Role framing, scoring rubric and language rules
    pub system_instruction: String,
    /// Ordered content parts
    pub parts: Vec<ContentPart>,
    /// Canonical JSON Schema of the expected record
    pub schema: serde_json::Value,
}

impl ContentPayload {
    /// Number of inline binary parts
    pub fn inline_part_count(&self) -> usize {
        self.parts.iter().filter(|p| p.is_inline_data()).count()
    }

    /// All text parts, in order
    pub fn text_parts(&self) -> Vec<&str> {
        self.parts.iter().filter_map(ContentPart::as_text).collect()
    }
}

/// Response format requested from the inference capability
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Plain text response
    Text,
    /// JSON object response (basic JSON mode, no schema enforcement)
    JsonObject,
    /// JSON Schema response (schema enforced by the capability)
    JsonSchema {
        name: String,
        schema: serde_json::Value,
        strict: bool,
    },
}

/// A single request to the inference capability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceRequest {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
    pub parts: Vec<ContentPart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
    /// Additional provider-specific parameters
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl InferenceRequest {
    /// Create a new request
    pub fn new(model: impl Into<String>, parts: Vec<ContentPart>) -> Self {
        Self {
            model: model.into(),
            system_instruction: None,
            parts,
            temperature: None,
            max_tokens: None,
            response_format: None,
            extra: HashMap::new(),
        }
    }

    /// Create a request carrying a payload's instruction and parts.
    ///
    /// The schema is not attached here; a JSON output strategy decides how
    /// it reaches the capability.
    pub fn from_payload(model: impl Into<String>, payload: &ContentPayload) -> Self {
        Self::new(model, payload.parts.clone())
            .with_system_instruction(payload.system_instruction.clone())
    }

    /// Set the system instruction
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set response format
    pub fn with_response_format(mut self, response_format: ResponseFormat) -> Self {
        self.response_format = Some(response_format);
        self
    }
}

/// Usage statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Finish reason
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Other(String),
}

/// Raw response of the inference capability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceResponse {
    pub id: String,
    pub model: String,
    /// Generated text; `None` when the capability produced nothing
    pub text: Option<String>,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

impl InferenceResponse {
    /// Create a response carrying text, with a stop finish reason
    pub fn from_text(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            model: model.into(),
            text: Some(text.into()),
            finish_reason: FinishReason::Stop,
            usage: Usage::default(),
        }
    }
}

/// Provider information
#[derive(Debug, Clone)]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
}

/// Per-analysis context used for tracing
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub provider_id: String,
    pub model: String,
}

impl RequestContext {
    /// Create a new request context with a fresh request id
    pub fn new(provider_id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            provider_id: provider_id.into(),
            model: model.into(),
        }
    }
}
