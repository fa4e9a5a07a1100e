use crate::constants::{NO_PRICE, NO_RATING};
use serde::{Deserialize, Serialize};

/// One decoded search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub title: String,
    pub url: String,
    pub price: Option<String>,
    pub rating: Option<String>,
}

impl ListingRecord {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            price: None,
            rating: None,
        }
    }

    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = Some(price.into());
        self
    }

    pub fn with_rating(mut self, rating: impl Into<String>) -> Self {
        self.rating = Some(rating.into());
        self
    }

    /// Price label, or "Price not available".
    pub fn price(&self) -> &str {
        self.price.as_deref().unwrap_or(NO_PRICE)
    }

    /// Rating label, or "No ratings yet".
    pub fn rating(&self) -> &str {
        self.rating.as_deref().unwrap_or(NO_RATING)
    }

    pub fn is_rated(&self) -> bool {
        self.rating.is_some()
    }
}

/// Listings in the relevance order returned by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResultSet {
    records: Vec<ListingRecord>,
    pub search_url: Option<String>,
    pub next_cursor: Option<String>,
}

impl SearchResultSet {
    pub fn new(records: Vec<ListingRecord>) -> Self {
        Self {
            records,
            search_url: None,
            next_cursor: None,
        }
    }

    pub fn records(&self) -> &[ListingRecord] {
        &self.records
    }

    /// The first `limit` records, order preserved.
    pub fn top(&self, limit: usize) -> &[ListingRecord] {
        let end = limit.min(self.records.len());
        &self.records[..end]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<ListingRecord> for SearchResultSet {
    fn from_iter<I: IntoIterator<Item = ListingRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
