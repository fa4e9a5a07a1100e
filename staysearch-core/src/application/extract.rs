//! Decoding `airbnb_search` payloads into listing records.
//!
//! The first content item of the result must be text holding a JSON
//! document with a `searchResults` array. Anything else is a
//! [`DecodeError`] that keeps the raw text for diagnostics.

use crate::domain::{ListingRecord, SearchResultSet};
use crate::rpc::InvocationResult;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
#[error("failed to decode search results: {reason}")]
pub struct DecodeError {
    pub reason: String,
    /// The payload as received, empty when there was no text item.
    pub raw: String,
}

impl DecodeError {
    fn new(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            raw: raw.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchEnvelope {
    search_results: Vec<RawListing>,
    #[serde(default)]
    search_url: Option<String>,
    #[serde(default)]
    pagination_info: Option<PaginationInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaginationInfo {
    #[serde(default)]
    next_page_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawListing {
    listing: Option<ListingDetails>,
    url: Option<String>,
    #[serde(default, rename = "avgRatingA11yLabel")]
    avg_rating_a11y_label: Option<String>,
    #[serde(default)]
    structured_display_price: Option<DisplayPrice>,
}

#[derive(Debug, Deserialize)]
struct ListingDetails {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DisplayPrice {
    primary_line: Option<PriceLine>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceLine {
    accessibility_label: Option<String>,
}

/// Extracts the listing records from a search tool result.
pub fn decode_search_results(result: &InvocationResult) -> Result<SearchResultSet, DecodeError> {
    let text = result
        .first_text()
        .ok_or_else(|| DecodeError::new("first content item is not text", String::new()))?;
    decode_search_text(text)
}

/// Extracts the listing records from the JSON text of a search result.
pub fn decode_search_text(text: &str) -> Result<SearchResultSet, DecodeError> {
    let envelope: SearchEnvelope = serde_json::from_str(text)
        .map_err(|source| DecodeError::new(format!("malformed search document: {source}"), text))?;

    let mut records = Vec::with_capacity(envelope.search_results.len());
    for (index, raw) in envelope.search_results.into_iter().enumerate() {
        let title = raw
            .listing
            .and_then(|details| details.title)
            .filter(|title| !title.trim().is_empty())
            .ok_or_else(|| DecodeError::new(format!("result {index} has no listing.title"), text))?;
        let url = raw
            .url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| DecodeError::new(format!("result {index} has no url"), text))?;

        records.push(ListingRecord {
            title,
            url,
            price: raw
                .structured_display_price
                .and_then(|price| price.primary_line)
                .and_then(|line| line.accessibility_label),
            rating: raw.avg_rating_a11y_label,
        });
    }

    debug!(count = records.len(), "Decoded search results");
    let mut set = SearchResultSet::new(records);
    set.search_url = envelope.search_url;
    set.next_cursor = envelope
        .pagination_info
        .and_then(|info| info.next_page_cursor);
    Ok(set)
}
