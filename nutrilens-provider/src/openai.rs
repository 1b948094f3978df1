//! OpenAI-compatible provider using the async-openai crate.
//!
//! Inline images travel as `data:` URLs inside a multi-part user message.

use async_openai::config::OpenAIConfig;
use async_openai::error::{ApiError, OpenAIError};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
    ChatCompletionRequestMessageContentPartText, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
    ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs, ImageUrl, ResponseFormat as OpenAIResponseFormat,
    ResponseFormatJsonSchema as OpenAIResponseFormatJsonSchema,
};
use async_openai::Client;
use async_trait::async_trait;
use nutrilens_core::error::{AnalysisError, TransportCause};
use nutrilens_core::provider::Provider;
use nutrilens_core::types::*;
use std::sync::Arc;
use std::time::Duration;

/// OpenAI provider using async-openai
#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    info: Arc<ProviderInfo>,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("info", &self.info)
            .finish()
    }
}

impl OpenAiProvider {
    /// Create a builder for configuration options
    pub fn builder() -> OpenAiBuilder {
        OpenAiBuilder::default()
    }

    /// Convert our content parts into a single user message
    fn convert_parts(parts: &[ContentPart]) -> Result<ChatCompletionRequestMessage, AnalysisError> {
        let has_image = parts.iter().any(ContentPart::is_inline_data);

        let content = if has_image {
            let converted = parts
                .iter()
                .map(|part| match part {
                    ContentPart::Text { text } => ChatCompletionRequestUserMessageContentPart::Text(
                        ChatCompletionRequestMessageContentPartText { text: text.clone() },
                    ),
                    ContentPart::InlineData { mime_type, data } => {
                        ChatCompletionRequestUserMessageContentPart::ImageUrl(
                            ChatCompletionRequestMessageContentPartImage {
                                image_url: ImageUrl {
                                    url: data_url(mime_type, data),
                                    detail: None,
                                },
                            },
                        )
                    }
                })
                .collect::<Vec<_>>();
            ChatCompletionRequestUserMessageContent::Array(converted)
        } else {
            let text = parts
                .iter()
                .filter_map(ContentPart::as_text)
                .collect::<Vec<_>>()
                .join("\n");
            ChatCompletionRequestUserMessageContent::Text(text)
        };

        let msg = ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()
            .map_err(|e| AnalysisError::provider(format!("Failed to build user message: {}", e)))?;
        Ok(ChatCompletionRequestMessage::User(msg))
    }

    /// Convert our ResponseFormat to OpenAI's ResponseFormat
    fn convert_response_format(format: &ResponseFormat) -> OpenAIResponseFormat {
        match format {
            ResponseFormat::Text => OpenAIResponseFormat::Text,
            ResponseFormat::JsonObject => OpenAIResponseFormat::JsonObject,
            ResponseFormat::JsonSchema {
                name,
                schema,
                strict,
            } => OpenAIResponseFormat::JsonSchema {
                json_schema: OpenAIResponseFormatJsonSchema {
                    name: name.clone(),
                    schema: Some(schema.clone()),
                    strict: Some(*strict),
                    description: None,
                },
            },
        }
    }

    /// Build CreateChatCompletionRequest from our InferenceRequest
    fn build_request(req: &InferenceRequest) -> Result<CreateChatCompletionRequest, AnalysisError> {
        let mut messages = Vec::with_capacity(2);

        if let Some(instruction) = &req.system_instruction {
            let msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(instruction.clone())
                .build()
                .map_err(|e| {
                    AnalysisError::provider(format!("Failed to build system message: {}", e))
                })?;
            messages.push(ChatCompletionRequestMessage::System(msg));
        }
        messages.push(Self::convert_parts(&req.parts)?);

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(&req.model).messages(messages);

        if let Some(max_tokens) = req.max_tokens {
            builder.max_tokens(max_tokens);
        }
        if let Some(temperature) = req.temperature {
            builder.temperature(temperature);
        }
        if let Some(response_format) = &req.response_format {
            builder.response_format(Self::convert_response_format(response_format));
        }

        builder
            .build()
            .map_err(|e| AnalysisError::provider(format!("Failed to build request: {}", e)))
    }

    /// Convert OpenAI response to our InferenceResponse
    fn convert_response(
        response: async_openai::types::CreateChatCompletionResponse,
    ) -> InferenceResponse {
        let usage = response.usage.map_or_else(Usage::default, |u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        let (text, finish_reason) = match response.choices.into_iter().next() {
            Some(choice) => {
                let finish_reason =
                    choice
                        .finish_reason
                        .map_or(FinishReason::Stop, |r| match r {
                            async_openai::types::FinishReason::Stop => FinishReason::Stop,
                            async_openai::types::FinishReason::Length => FinishReason::Length,
                            async_openai::types::FinishReason::ContentFilter => {
                                FinishReason::ContentFilter
                            }
                            other => FinishReason::Other(format!("{:?}", other)),
                        });
                (choice.message.content, finish_reason)
            }
            None => (None, FinishReason::Other("no choices".to_string())),
        };

        InferenceResponse {
            id: response.id,
            model: response.model,
            text,
            finish_reason,
            usage,
        }
    }
}

fn data_url(mime_type: &str, data: &str) -> String {
    format!("data:{};base64,{}", mime_type, data)
}

/// Map an async-openai error onto our transport taxonomy
fn classify_error(err: OpenAIError) -> AnalysisError {
    let message = format!("OpenAI API error: {}", err);
    let cause = match &err {
        OpenAIError::Reqwest(inner) if inner.is_timeout() => TransportCause::Timeout,
        OpenAIError::Reqwest(_) => TransportCause::Network,
        OpenAIError::ApiError(api) => {
            classify_api_error(api).unwrap_or_else(|| classify_message(&api.message))
        }
        _ => classify_message(&message),
    };
    tracing::debug!("classified OpenAI failure as {}", cause);
    AnalysisError::transport(cause, message)
}

/// Classify by the structured `code`/`type` of an API error body
fn classify_api_error(api: &ApiError) -> Option<TransportCause> {
    [api.code.as_deref(), api.r#type.as_deref()]
        .into_iter()
        .flatten()
        .find_map(|tag| match tag {
            "invalid_api_key" | "invalid_authentication" | "authentication_error" => {
                Some(TransportCause::Authentication)
            }
            "rate_limit_exceeded" | "insufficient_quota" | "rate_limit_error" => {
                Some(TransportCause::RateLimit)
            }
            "model_not_found" => Some(TransportCause::ModelNotFound),
            _ => None,
        })
}

/// Fallback for errors without a usable code
fn classify_message(message: &str) -> TransportCause {
    let lower = message.to_ascii_lowercase();
    if lower.contains("api key") || lower.contains("unauthorized") {
        TransportCause::Authentication
    } else if lower.contains("rate limit") || lower.contains("quota") {
        TransportCause::RateLimit
    } else if lower.contains("model") && (lower.contains("does not exist") || lower.contains("not found")) {
        TransportCause::ModelNotFound
    } else {
        TransportCause::Provider
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn info(&self) -> Arc<ProviderInfo> {
        self.info.clone()
    }

    async fn generate(&self, req: InferenceRequest) -> Result<InferenceResponse, AnalysisError> {
        let openai_req = Self::build_request(&req)?;

        let response = self
            .client
            .chat()
            .create(openai_req)
            .await
            .map_err(classify_error)?;

        Ok(Self::convert_response(response))
    }
}

/// Builder for OpenAI provider with custom configuration
#[derive(Default)]
pub struct OpenAiBuilder {
    api_key: Option<String>,
    api_base: Option<String>,
    org_id: Option<String>,
    timeout: Option<Duration>,
}

impl OpenAiBuilder {
    /// Set API key
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set API base URL (for OpenAI-compatible endpoints)
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Set organization ID
    pub fn organization(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }

    /// Set the HTTP timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the provider
    pub fn build(self) -> Result<OpenAiProvider, AnalysisError> {
        self.build_with_id("openai", "OpenAI")
    }

    /// Build a provider with a custom provider ID and name
    ///
    /// The id selects the JSON output strategy, so compatible endpoints
    /// without schema support should use an id other than `openai`.
    pub fn build_with_id(
        self,
        provider_id: impl Into<String>,
        provider_name: impl Into<String>,
    ) -> Result<OpenAiProvider, AnalysisError> {
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AnalysisError::configuration("API key is required"))?;

        let mut config = OpenAIConfig::new().with_api_key(api_key);

        if let Some(api_base) = self.api_base {
            config = config.with_api_base(api_base);
        }

        if let Some(org_id) = self.org_id {
            config = config.with_org_id(org_id);
        }

        let mut http = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }
        let http = http
            .build()
            .map_err(|e| AnalysisError::configuration(format!("HTTP client: {}", e)))?;

        // async-openai backs off and re-sends on 429/5xx by default; the
        // first failure must reach the caller instead
        let client = Client::with_config(config)
            .with_http_client(http)
            .with_backoff(single_attempt());

        Ok(OpenAiProvider {
            client,
            info: Arc::new(ProviderInfo {
                id: provider_id.into(),
                name: provider_name.into(),
            }),
        })
    }
}

fn single_attempt() -> backoff::ExponentialBackoff {
    backoff::ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::{Reply, StubServer};
    use nutrilens_core::error::FailureKind;

    #[test]
    fn test_image_parts_become_data_urls() {
        let req = InferenceRequest::new(
            "gpt-4o",
            vec![
                ContentPart::inline_data("image/png", "AAAA"),
                ContentPart::text("Analise nutricionalmente o alimento nesta imagem."),
            ],
        )
        .with_system_instruction("Você é um nutricionista.");

        let built = OpenAiProvider::build_request(&req).unwrap();
        let value = serde_json::to_value(&built).unwrap();

        assert_eq!(value["messages"][0]["role"], "system");
        let content = value["messages"][1]["content"].as_array().unwrap();
        assert_eq!(content.len(), 2);
        assert_eq!(content[0]["image_url"]["url"], "data:image/png;base64,AAAA");
        assert_eq!(
            content[1]["text"],
            "Analise nutricionalmente o alimento nesta imagem."
        );
    }

    #[test]
    fn test_text_only_is_plain_content() {
        let req = InferenceRequest::new("gpt-4o", vec![ContentPart::text("Alimento para analisar: ovo")])
            .with_response_format(ResponseFormat::JsonObject);

        let value = serde_json::to_value(OpenAiProvider::build_request(&req).unwrap()).unwrap();

        assert_eq!(value["messages"].as_array().unwrap().len(), 1);
        assert_eq!(value["messages"][0]["content"], "Alimento para analisar: ovo");
        assert_eq!(value["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_json_schema_format() {
        let req = InferenceRequest::new("gpt-4o", vec![ContentPart::text("x")]).with_response_format(
            ResponseFormat::JsonSchema {
                name: "nutrition_record".to_string(),
                schema: serde_json::json!({"type": "object"}),
                strict: false,
            },
        );

        let value = serde_json::to_value(OpenAiProvider::build_request(&req).unwrap()).unwrap();
        assert_eq!(value["response_format"]["type"], "json_schema");
        assert_eq!(value["response_format"]["json_schema"]["name"], "nutrition_record");
    }

    #[test]
    fn test_classify_message() {
        assert_eq!(
            classify_message("Incorrect API key provided"),
            TransportCause::Authentication
        );
        assert_eq!(
            classify_message("You exceeded your current quota"),
            TransportCause::RateLimit
        );
        assert_eq!(
            classify_message("The model `gpt-9` does not exist"),
            TransportCause::ModelNotFound
        );
        assert_eq!(classify_message("server exploded"), TransportCause::Provider);
    }

    fn api_error(code: Option<&str>, kind: Option<&str>, message: &str) -> ApiError {
        ApiError {
            message: message.to_string(),
            r#type: kind.map(str::to_string),
            param: None,
            code: code.map(str::to_string),
        }
    }

    #[test]
    fn test_api_error_codes_take_precedence() {
        let cause = |api| classify_error(OpenAIError::ApiError(api)).transport_cause();

        assert_eq!(
            cause(api_error(Some("invalid_api_key"), None, "bad")),
            Some(TransportCause::Authentication)
        );
        assert_eq!(
            cause(api_error(None, Some("insufficient_quota"), "billing")),
            Some(TransportCause::RateLimit)
        );
        assert_eq!(
            cause(api_error(Some("model_not_found"), None, "nope")),
            Some(TransportCause::ModelNotFound)
        );
        // digits in the message text are not status codes
        assert_eq!(
            cause(api_error(
                Some("server_error"),
                Some("server_error"),
                "request 401-abc failed"
            )),
            Some(TransportCause::Provider)
        );
        assert_eq!(
            cause(api_error(None, None, "Rate limit reached for requests")),
            Some(TransportCause::RateLimit)
        );
    }

    #[tokio::test]
    async fn test_rate_limit_is_returned_after_one_attempt() {
        let body = r#"{"error":{"message":"Rate limit reached","type":"requests","param":null,"code":"rate_limit_exceeded"}}"#;
        let server = StubServer::start(Reply::Json(429, body.to_string())).await;
        let provider = OpenAiProvider::builder()
            .api_key("key")
            .api_base(format!("{}/v1", server.base))
            .build()
            .unwrap();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            provider.generate(InferenceRequest::new("gpt-4o", vec![ContentPart::text("ovo")])),
        )
        .await
        .expect("rate limit must surface without backing off");

        let err = result.unwrap_err();
        assert_eq!(err.transport_cause(), Some(TransportCause::RateLimit));
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test]
    async fn test_server_error_is_not_resent() {
        let body = r#"{"error":{"message":"upstream down","type":"server_error","param":null,"code":null}}"#;
        let server = StubServer::start(Reply::Json(503, body.to_string())).await;
        let provider = OpenAiProvider::builder()
            .api_key("key")
            .api_base(format!("{}/v1", server.base))
            .build()
            .unwrap();

        let err = tokio::time::timeout(
            Duration::from_secs(5),
            provider.generate(InferenceRequest::new("gpt-4o", vec![ContentPart::text("ovo")])),
        )
        .await
        .expect("server error must surface without backing off")
        .unwrap_err();

        assert_eq!(err.transport_cause(), Some(TransportCause::Provider));
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test]
    async fn test_timeout_bounds_the_http_call() {
        let server = StubServer::start(Reply::Silent).await;
        let provider = OpenAiProvider::builder()
            .api_key("key")
            .api_base(format!("{}/v1", server.base))
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();

        let err = tokio::time::timeout(
            Duration::from_secs(5),
            provider.generate(InferenceRequest::new("gpt-4o", vec![ContentPart::text("ovo")])),
        )
        .await
        .expect("client timeout must fire first")
        .unwrap_err();

        assert_eq!(err.transport_cause(), Some(TransportCause::Timeout));
    }

    #[test]
    fn test_builder_requires_key() {
        let err = OpenAiProvider::builder().build().unwrap_err();
        assert_eq!(err.kind(), FailureKind::Configuration);
    }
}
