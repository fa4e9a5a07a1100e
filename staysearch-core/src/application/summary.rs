//! Delegated summarization through a [`TextGenerator`].
//!
//! The credential is resolved before anything is sent, so a missing key
//! never costs a round trip.

use crate::config::SummarizerConfig;
use crate::domain::SearchResultSet;
use crate::model::{ChatMessage, GenerationRequest, ModelError, TextGenerator};
use serde::Serialize;
use std::env;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("environment variable '{variable}' with the text-generation API key is not set")]
    Configuration { variable: String },
    #[error("text-generation service '{service}' failed: {reason}")]
    Service { service: String, reason: String },
}

impl SummaryError {
    fn from_model(service: &str, err: &ModelError) -> Self {
        Self::Service {
            service: service.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Compact view of one listing handed to the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingDigest<'a> {
    pub title: &'a str,
    pub url: &'a str,
    pub rating: &'a str,
    pub price: &'a str,
}

/// Projects the first `limit` listings with the same fallbacks the direct
/// report uses.
pub fn digest(results: &SearchResultSet, limit: usize) -> Vec<ListingDigest<'_>> {
    results
        .top(limit)
        .iter()
        .map(|record| ListingDigest {
            title: &record.title,
            url: &record.url,
            rating: record.rating(),
            price: record.price(),
        })
        .collect()
}

/// Builds the instruction sent to the generator.
pub fn build_prompt(listings: &[ListingDigest<'_>]) -> String {
    let projection =
        serde_json::to_string_pretty(listings).unwrap_or_else(|_| "[]".to_string());
    format!(
        "Here are some vacation rental listings from a property search:\n\n\
         {projection}\n\n\
         Please format these results so they look good in a plain terminal with no special \
         characters or emojis. Use simple text formatting that will display well in any \
         terminal environment. Include:\n\n\
         1. The property title\n\
         2. Price information\n\
         3. Ratings\n\
         4. Direct link to the property\n\n\
         Make it easy to read with clear section separators and a consistent format. Also \
         provide a brief summary of the range of options available."
    )
}

/// Reads the API key from the named variable; blank counts as absent.
pub fn resolve_api_key(variable: &str) -> Option<String> {
    match env::var(variable) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        Ok(_) => {
            warn!(env_var = variable, "API key environment variable is empty");
            None
        }
        Err(err) => {
            warn!(env_var = variable, %err, "API key environment variable is not set");
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct Summarizer {
    config: SummarizerConfig,
}

impl Summarizer {
    pub fn new(config: SummarizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SummarizerConfig {
        &self.config
    }

    /// Asks `generator` for a terminal-friendly report of the first
    /// `limit` listings.
    pub async fn summarize(
        &self,
        results: &SearchResultSet,
        limit: usize,
        generator: &dyn TextGenerator,
    ) -> Result<String, SummaryError> {
        let api_key =
            resolve_api_key(&self.config.api_key_env).ok_or_else(|| SummaryError::Configuration {
                variable: self.config.api_key_env.clone(),
            })?;

        let listings = digest(results, limit);
        let request = GenerationRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            system: self.config.system_prompt.clone(),
            messages: vec![ChatMessage::user(build_prompt(&listings))],
            api_key,
        };

        info!(
            service = generator.id(),
            listings = listings.len(),
            "Requesting summary"
        );
        let blocks = generator
            .generate(request)
            .await
            .map_err(|err| {
                warn!(
                    service = generator.id(),
                    hint = %err.user_message(),
                    error = %err,
                    "text generation failed"
                );
                SummaryError::from_model(generator.id(), &err)
            })?;

        let text = blocks
            .iter()
            .map(|block| block.trim())
            .filter(|block| !block.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        if text.is_empty() {
            return Err(SummaryError::Service {
                service: generator.id().to_string(),
                reason: "response contained no text".to_string(),
            });
        }
        Ok(text)
    }
}
