//! Anthropic Messages API client

use super::base::HttpClientBase;
use crate::config::SummarizerConfig;
use crate::infrastructure::model::traits::TextGenerator;
use crate::infrastructure::model::types::{ChatMessage, GenerationRequest, ModelError};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    base: HttpClientBase,
    api_path: String,
}

impl AnthropicClient {
    pub fn from_config(config: &SummarizerConfig) -> Result<Self, ModelError> {
        Ok(Self {
            base: HttpClientBase::new(
                "anthropic".to_string(),
                config.endpoint.clone(),
                config.timeout,
            )?,
            api_path: config.api_path.clone(),
        })
    }

    fn headers(&self, api_key: &str) -> Result<HeaderMap, ModelError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key).map_err(|_| {
            ModelError::invalid_response(&self.base.id, "API key is not a valid header value")
        })?;
        headers.insert("x-api-key", key);
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl TextGenerator for AnthropicClient {
    fn id(&self) -> &str {
        &self.base.id
    }

    async fn generate(&self, request: GenerationRequest) -> Result<Vec<String>, ModelError> {
        let url = self.base.build_url(&self.api_path);
        let headers = self.headers(&request.api_key)?;

        let payload = MessagesRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: &request.system,
            messages: &request.messages,
        };

        info!(
            provider = self.base.id.as_str(),
            model = request.model.as_str(),
            messages = request.messages.len(),
            "Sending request to text-generation service"
        );

        let response: MessagesResponse = self.base.post_json(&url, headers, &payload).await?;
        debug!(
            blocks = response.content.len(),
            stop_reason = response.stop_reason.as_deref().unwrap_or("unknown"),
            "Received response from text-generation service"
        );

        Ok(response
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect())
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}
