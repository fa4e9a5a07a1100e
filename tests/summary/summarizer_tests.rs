// Summarizer tests - delegated summarization with a scripted generator

use async_trait::async_trait;
use serial_test::serial;
use staysearch_core::config::SummarizerConfig;
use staysearch_core::model::{GenerationRequest, ModelError, TextGenerator};
use staysearch_core::summary::{Summarizer, SummaryError};
use staysearch_core::{ListingRecord, SearchResultSet};
use std::env;
use std::sync::Mutex;

const KEY_VAR: &str = "STAYSEARCH_TEST_GENERATOR_KEY";

/// Records every request and answers with a fixed outcome.
struct ScriptedGenerator {
    reply: Result<Vec<String>, String>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    fn answering(blocks: &[&str]) -> Self {
        Self {
            reply: Ok(blocks.iter().map(|b| b.to_string()).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn failing(reason: &str) -> Self {
        Self {
            reply: Err(reason.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.requests.lock().expect("lock").len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn id(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<Vec<String>, ModelError> {
        self.requests.lock().expect("lock").push(request);
        match &self.reply {
            Ok(blocks) => Ok(blocks.clone()),
            Err(reason) => Err(ModelError::invalid_response("scripted", reason.clone())),
        }
    }
}

fn listings() -> SearchResultSet {
    (1..=7)
        .map(|i| {
            ListingRecord::new(format!("Loft {i}"), format!("https://www.airbnb.com/rooms/{i}"))
                .with_price(format!("${} per night", 90 + i))
        })
        .collect()
}

fn summarizer() -> Summarizer {
    Summarizer::new(SummarizerConfig::default().with_api_key_env(KEY_VAR))
}

fn set_key(value: Option<&str>) {
    // SAFETY: tests touching the key variable are serialized.
    unsafe {
        match value {
            Some(value) => env::set_var(KEY_VAR, value),
            None => env::remove_var(KEY_VAR),
        }
    }
}

#[tokio::test]
#[serial]
async fn missing_key_fails_without_calling_generator() {
    set_key(None);
    let generator = ScriptedGenerator::answering(&["unused"]);

    let result = summarizer().summarize(&listings(), 5, &generator).await;

    assert!(matches!(
        result,
        Err(SummaryError::Configuration { ref variable }) if variable == KEY_VAR
    ));
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
#[serial]
async fn blank_key_counts_as_missing() {
    set_key(Some("   "));
    let generator = ScriptedGenerator::answering(&["unused"]);

    let result = summarizer().summarize(&listings(), 5, &generator).await;

    assert!(matches!(result, Err(SummaryError::Configuration { .. })));
    assert_eq!(generator.calls(), 0);
    set_key(None);
}

#[tokio::test]
#[serial]
async fn summary_joins_generated_blocks() {
    set_key(Some("test-key"));
    let generator = ScriptedGenerator::answering(&["Top picks in Paris", "  ", "Loft 1 is cheapest"]);

    let text = summarizer()
        .summarize(&listings(), 5, &generator)
        .await
        .expect("summary");
    set_key(None);

    assert_eq!(text, "Top picks in Paris\n\nLoft 1 is cheapest");
    let requests = generator.requests.lock().expect("lock");
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.api_key, "test-key");
    assert_eq!(request.model, "claude-3-opus-20240229");
    assert_eq!(request.max_tokens, 1000);
    assert!((request.temperature - 0.3).abs() < f32::EPSILON);
    let prompt = &request.messages[0].content;
    assert!(prompt.contains("Loft 5"));
    assert!(!prompt.contains("Loft 6"));
}

#[tokio::test]
#[serial]
async fn empty_generation_is_service_error() {
    set_key(Some("test-key"));
    let generator = ScriptedGenerator::answering(&[]);

    let result = summarizer().summarize(&listings(), 5, &generator).await;
    set_key(None);

    assert!(matches!(result, Err(SummaryError::Service { .. })));
}

#[tokio::test]
#[serial]
async fn generator_failure_is_service_error() {
    set_key(Some("test-key"));
    let generator = ScriptedGenerator::failing("overloaded");

    let result = summarizer().summarize(&listings(), 5, &generator).await;
    set_key(None);

    match result {
        Err(SummaryError::Service { service, reason }) => {
            assert_eq!(service, "scripted");
            assert!(reason.contains("overloaded"));
        }
        other => panic!("expected service error, got {other:?}"),
    }
}
