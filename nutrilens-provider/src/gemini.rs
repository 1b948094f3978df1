//! Gemini provider over the `generateContent` REST endpoint.
//!
//! The canonical output schema is draft 2020-12 JSON Schema; Gemini accepts
//! an OpenAPI subset instead, so [`to_gemini_schema`] translates it on the
//! way out.

use async_trait::async_trait;
use nutrilens_core::error::AnalysisError;
use nutrilens_core::provider::Provider;
use nutrilens_core::types::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Deepest `$ref` chain followed before giving up
const MAX_SCHEMA_DEPTH: usize = 32;

/// Keywords of the OpenAPI subset Gemini understands
const GEMINI_SCHEMA_KEYWORDS: [&str; 13] = [
    "type",
    "description",
    "enum",
    "properties",
    "required",
    "items",
    "minimum",
    "maximum",
    "minItems",
    "maxItems",
    "minLength",
    "maxLength",
    "nullable",
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
    response_id: Option<String>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    status: Option<String>,
}

/// Gemini provider
#[derive(Clone)]
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    info: Arc<ProviderInfo>,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_base", &self.api_base)
            .field("info", &self.info)
            .finish()
    }
}

impl GeminiProvider {
    /// Create a builder for configuration options
    pub fn builder() -> GeminiBuilder {
        GeminiBuilder::default()
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            model
        )
    }

    /// Build the wire body from our request
    fn build_body(req: &InferenceRequest) -> Result<GenerateContentRequest, AnalysisError> {
        let parts = req
            .parts
            .iter()
            .map(|part| match part {
                ContentPart::Text { text } => Part::Text { text: text.clone() },
                ContentPart::InlineData { mime_type, data } => Part::InlineData {
                    inline_data: InlineData {
                        mime_type: mime_type.clone(),
                        data: data.clone(),
                    },
                },
            })
            .collect();

        let system_instruction = req.system_instruction.as_ref().map(|text| Content {
            role: None,
            parts: vec![Part::Text { text: text.clone() }],
        });

        let mut config = GenerationConfig {
            temperature: req.temperature,
            max_output_tokens: req.max_tokens,
            ..GenerationConfig::default()
        };

        match &req.response_format {
            Some(ResponseFormat::JsonSchema { schema, .. }) => {
                config.response_mime_type = Some("application/json".to_string());
                config.response_schema = Some(to_gemini_schema(schema)?);
            }
            Some(ResponseFormat::JsonObject) => {
                config.response_mime_type = Some("application/json".to_string());
            }
            Some(ResponseFormat::Text) | None => {}
        }

        let has_config = config.temperature.is_some()
            || config.max_output_tokens.is_some()
            || config.response_mime_type.is_some();

        Ok(GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            system_instruction,
            generation_config: has_config.then_some(config),
        })
    }

    /// Convert the wire response to ours
    fn convert_response(response: GenerateContentResponse, model: &str) -> InferenceResponse {
        let usage = response.usage_metadata.map_or_else(Usage::default, |u| Usage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        let id = response
            .response_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let model = response.model_version.unwrap_or_else(|| model.to_string());

        let Some(candidate) = response.candidates.into_iter().next() else {
            let block_reason = response.prompt_feedback.and_then(|f| f.block_reason);
            tracing::warn!("Gemini returned no candidates, block_reason={:?}", block_reason);
            let reason = block_reason.map_or(FinishReason::Other("no candidates".to_string()), |_| {
                FinishReason::ContentFilter
            });
            return InferenceResponse {
                id,
                model,
                text: None,
                finish_reason: reason,
                usage,
            };
        };

        let text = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter(|part| !part.thought)
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .filter(|text| !text.is_empty());

        InferenceResponse {
            id,
            model,
            text,
            finish_reason: convert_finish_reason(candidate.finish_reason.as_deref()),
            usage,
        }
    }
}

fn convert_finish_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        None | Some("STOP") => FinishReason::Stop,
        Some("MAX_TOKENS") => FinishReason::Length,
        Some("SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII") => {
            FinishReason::ContentFilter
        }
        Some(other) => FinishReason::Other(other.to_string()),
    }
}

/// Classify a non-success HTTP status from the Gemini API
fn error_from_status(status: u16, body: &str) -> AnalysisError {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| match envelope.error.status {
            Some(code) => format!("{}: {}", code, envelope.error.message),
            None => envelope.error.message,
        })
        .unwrap_or_else(|_| body.trim().to_string());
    let message = format!("Gemini API error ({}): {}", status, detail);

    match status {
        401 | 403 => AnalysisError::authentication(message),
        404 => AnalysisError::model_not_found(message),
        408 | 504 => AnalysisError::timeout(message),
        429 => AnalysisError::rate_limit(message),
        _ => AnalysisError::provider(message),
    }
}

/// Translate a canonical JSON Schema into Gemini's response schema dialect.
///
/// Inlines `$ref`s against the root `$defs`, turns `null` unions into
/// `nullable`, upper-cases type names and drops keywords Gemini rejects.
pub fn to_gemini_schema(schema: &Value) -> Result<Value, AnalysisError> {
    convert_node(schema, schema, 0)
}

fn convert_node(node: &Value, root: &Value, depth: usize) -> Result<Value, AnalysisError> {
    if depth > MAX_SCHEMA_DEPTH {
        return Err(AnalysisError::configuration(
            "output schema nests too deeply for Gemini",
        ));
    }

    let Some(object) = node.as_object() else {
        return Ok(node.clone());
    };

    if let Some(reference) = object.get("$ref").and_then(Value::as_str) {
        let target = resolve_ref(reference, root)?;
        let mut resolved = convert_node(target, root, depth + 1)?;
        // Sibling keywords such as a description override the target's
        if let (Some(resolved_map), Some(description)) =
            (resolved.as_object_mut(), object.get("description"))
        {
            resolved_map.insert("description".to_string(), description.clone());
        }
        return Ok(resolved);
    }

    let mut out = Map::new();
    let mut nullable = false;

    for (key, value) in object {
        match key.as_str() {
            "type" => match value {
                Value::Array(types) => {
                    nullable |= types.iter().any(|t| t == "null");
                    if let Some(first) = types.iter().filter_map(Value::as_str).find(|t| *t != "null")
                    {
                        out.insert("type".to_string(), Value::String(first.to_uppercase()));
                    }
                }
                Value::String(t) => {
                    out.insert("type".to_string(), Value::String(t.to_uppercase()));
                }
                _ => {}
            },
            "anyOf" | "oneOf" => {
                let variants = value.as_array().cloned().unwrap_or_default();
                let (nulls, rest): (Vec<_>, Vec<_>) = variants
                    .into_iter()
                    .partition(|v| v.get("type").and_then(Value::as_str) == Some("null"));
                nullable |= !nulls.is_empty();
                match rest.as_slice() {
                    [single] => {
                        if let Value::Object(inner) = convert_node(single, root, depth + 1)? {
                            for (k, v) in inner {
                                out.entry(k).or_insert(v);
                            }
                        }
                    }
                    many => {
                        let converted = many
                            .iter()
                            .map(|v| convert_node(v, root, depth + 1))
                            .collect::<Result<Vec<_>, _>>()?;
                        out.insert("anyOf".to_string(), Value::Array(converted));
                    }
                }
            }
            "properties" => {
                let mut properties = Map::new();
                if let Some(map) = value.as_object() {
                    for (name, property) in map {
                        properties.insert(name.clone(), convert_node(property, root, depth + 1)?);
                    }
                }
                out.insert("properties".to_string(), Value::Object(properties));
            }
            "items" => {
                out.insert("items".to_string(), convert_node(value, root, depth + 1)?);
            }
            keyword if GEMINI_SCHEMA_KEYWORDS.contains(&keyword) => {
                out.insert(key.clone(), value.clone());
            }
            _ => {}
        }
    }

    if out.contains_key("enum") && out.get("type") == Some(&Value::String("STRING".to_string())) {
        out.insert("format".to_string(), Value::String("enum".to_string()));
    }
    if nullable {
        out.insert("nullable".to_string(), Value::Bool(true));
    }

    Ok(Value::Object(out))
}

fn resolve_ref<'a>(reference: &str, root: &'a Value) -> Result<&'a Value, AnalysisError> {
    let pointer = reference.strip_prefix('#').ok_or_else(|| {
        AnalysisError::configuration(format!("external schema reference '{}'", reference))
    })?;
    root.pointer(pointer).ok_or_else(|| {
        AnalysisError::configuration(format!("unresolvable schema reference '{}'", reference))
    })
}

#[async_trait]
impl Provider for GeminiProvider {
    fn info(&self) -> Arc<ProviderInfo> {
        self.info.clone()
    }

    async fn generate(&self, req: InferenceRequest) -> Result<InferenceResponse, AnalysisError> {
        let body = Self::build_body(&req)?;

        let response = self
            .client
            .post(self.endpoint(&req.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = match response.text().await {
                Ok(text) => text,
                Err(e) => format!("unreadable error body: {}", e),
            };
            tracing::debug!("Gemini API returned {}", status);
            return Err(error_from_status(status.as_u16(), &text));
        }

        let payload: GenerateContentResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                AnalysisError::timeout(e.to_string())
            } else {
                AnalysisError::provider(format!("undecodable Gemini response: {}", e))
            }
        })?;

        Ok(Self::convert_response(payload, &req.model))
    }
}

/// Builder for the Gemini provider
#[derive(Default)]
pub struct GeminiBuilder {
    api_key: Option<String>,
    api_base: Option<String>,
    timeout: Option<Duration>,
}

impl GeminiBuilder {
    /// Set API key
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set API base URL
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Set the HTTP timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the provider
    pub fn build(self) -> Result<GeminiProvider, AnalysisError> {
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AnalysisError::configuration("API key is required"))?;

        let mut client = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            client = client.timeout(timeout);
        }
        let client = client
            .build()
            .map_err(|e| AnalysisError::configuration(format!("HTTP client: {}", e)))?;

        Ok(GeminiProvider {
            client,
            api_key,
            api_base: self.api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            info: Arc::new(ProviderInfo {
                id: "gemini".to_string(),
                name: "Google Gemini".to_string(),
            }),
        })
    }
}
