//! End-to-end analysis against a scripted provider.

use async_trait::async_trait;
use nutrilens::prelude::*;
use nutrilens::{ContentPart, InferenceRequest, InferenceResponse, ProviderInfo, ResponseFormat};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const CHICKEN: &str = r#"{
    "foodName": "Peito de frango grelhado",
    "description": "Peito de frango grelhado sem pele",
    "estimatedWeight": "150g",
    "calories": 247.5,
    "macros": {"protein": 46.5, "carbs": 0, "fat": 5.4, "fiber": 0},
    "micronutrients": [{"label": "Sódio", "value": 111, "unit": "mg"}],
    "allergens": [],
    "healthScore": 85,
    "pros": ["Rico em proteína"],
    "cons": [],
    "tips": ["Acompanhe com salada"],
    "processingLevel": "Minimamente Processado"
}"#;

#[derive(Debug, Default)]
struct MockProvider {
    reply: Option<String>,
    fail: bool,
    calls: AtomicUsize,
    requests: Mutex<Vec<InferenceRequest>>,
}

impl MockProvider {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(text.to_string()),
            ..Default::default()
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Default::default()
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_request(&self) -> InferenceRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn info(&self) -> Arc<ProviderInfo> {
        Arc::new(ProviderInfo {
            id: "gemini".to_string(),
            name: "Mock".to_string(),
        })
    }

    async fn generate(&self, req: InferenceRequest) -> Result<InferenceResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let model = req.model.clone();
        self.requests.lock().unwrap().push(req);

        if self.fail {
            return Err(AnalysisError::rate_limit("quota exceeded"));
        }
        Ok(match &self.reply {
            Some(text) => InferenceResponse::from_text(model, text.clone()),
            None => InferenceResponse {
                text: None,
                ..InferenceResponse::from_text(model, "")
            },
        })
    }
}

fn analyzer(provider: &Arc<MockProvider>) -> Analyzer {
    Analyzer::builder(provider.clone())
        .model("gemini-3-pro-preview")
        .finish()
        .unwrap()
}

fn with_field(field: &str, value: serde_json::Value) -> String {
    let mut record: serde_json::Value = serde_json::from_str(CHICKEN).unwrap();
    record[field] = value;
    record.to_string()
}

#[tokio::test]
async fn text_only_analysis_returns_record() {
    let provider = MockProvider::replying(CHICKEN);
    let analyzer = analyzer(&provider);

    let record = nutrilens::analyze_food(&analyzer, None, Some("grilled chicken breast, 150g"))
        .await
        .unwrap();

    assert!(!record.food_name.is_empty());
    assert!(record.macros.protein > 0.0);
    assert_eq!(provider.calls(), 1);

    let request = provider.last_request();
    assert_eq!(request.parts.len(), 1);
    assert_eq!(
        request.parts[0].as_text(),
        Some("Alimento para analisar: grilled chicken breast, 150g")
    );
    assert!(request.system_instruction.is_some());
    assert!(matches!(
        request.response_format,
        Some(ResponseFormat::JsonSchema { .. })
    ));
}

#[tokio::test]
async fn image_only_non_json_reply_is_malformed() {
    let provider = MockProvider::replying("not json");
    let analyzer = analyzer(&provider);

    let err = nutrilens::analyze_food(&analyzer, Some("data:image/jpeg;base64,AAAA"), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::MalformedResponse);

    let request = provider.last_request();
    assert_eq!(request.parts.len(), 2);
    assert_eq!(
        request.parts[0],
        ContentPart::inline_data("image/jpeg", "AAAA")
    );
    assert!(!request.parts[1]
        .as_text()
        .unwrap()
        .starts_with("Alimento para analisar:"));
}

#[tokio::test]
async fn missing_input_never_calls_provider() {
    let provider = MockProvider::replying(CHICKEN);
    let analyzer = analyzer(&provider);

    for (image, text) in [(None, None), (Some(""), Some("   ")), (None, Some(""))] {
        let err = nutrilens::analyze_food(&analyzer, image, text)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Precondition);
    }

    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn image_and_text_carry_the_query() {
    let provider = MockProvider::replying(CHICKEN);
    let analyzer = analyzer(&provider);

    analyzer
        .analyze_food(Some("AAAA"), Some("sem pele"))
        .await
        .unwrap();

    let request = provider.last_request();
    let inline = request.parts.iter().filter(|p| p.is_inline_data()).count();
    let texts: Vec<_> = request.parts.iter().filter_map(ContentPart::as_text).collect();
    assert_eq!(inline, 1);
    assert_eq!(texts, vec!["Alimento para analisar: sem pele"]);
}

#[tokio::test]
async fn record_fields_are_verbatim() {
    let provider = MockProvider::replying(CHICKEN);
    let record = analyzer(&provider)
        .analyze_food(None, Some("frango"))
        .await
        .unwrap();

    assert_eq!(record.calories, 247.5);
    assert_eq!(record.macros.fat, 5.4);
    assert_eq!(record.health_score, 85);
    assert_eq!(record.estimated_weight, "150g");
    assert_eq!(record.micronutrients[0].value, 111.0);
    assert_eq!(record.processing_level, ProcessingLevel::MinimallyProcessed);
    assert_eq!(record.health_rating(), HealthRating::Good);
    assert!(record.confidence.is_none());
}

#[tokio::test]
async fn out_of_range_health_score_is_not_clamped() {
    for score in [serde_json::json!(150), serde_json::json!(-5)] {
        let provider = MockProvider::replying(&with_field("healthScore", score));
        let err = analyzer(&provider)
            .analyze_food(None, Some("frango"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::MalformedResponse);
    }
}

#[tokio::test]
async fn unknown_processing_level_is_malformed() {
    let provider = MockProvider::replying(&with_field(
        "processingLevel",
        serde_json::json!("Caseiro"),
    ));
    let err = analyzer(&provider)
        .analyze_food(None, Some("frango"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::MalformedResponse);
}

#[tokio::test]
async fn empty_reply_and_transport_failure_are_distinct() {
    let provider = Arc::new(MockProvider::default());
    let err = analyzer(&provider)
        .analyze_food(None, Some("frango"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::EmptyResponse);

    let provider = MockProvider::failing();
    let err = analyzer(&provider)
        .analyze_food(None, Some("frango"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Transport);
    assert_eq!(err.transport_cause(), Some(TransportCause::RateLimit));
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn concurrent_analyses_are_independent() {
    let provider = MockProvider::replying(CHICKEN);
    let analyzer = analyzer(&provider);

    let queries = ["arroz", "feijão", "farofa", "couve"];
    let results = futures::future::join_all(
        queries
            .iter()
            .map(|q| analyzer.analyze_food(None, Some(*q))),
    )
    .await;

    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(provider.calls(), queries.len());

    let mut sent: Vec<String> = provider
        .requests
        .lock()
        .unwrap()
        .iter()
        .filter_map(|r| r.parts[0].as_text().map(str::to_string))
        .collect();
    sent.sort();
    let mut expected: Vec<String> = queries
        .iter()
        .map(|q| format!("Alimento para analisar: {}", q))
        .collect();
    expected.sort();
    assert_eq!(sent, expected);
}
