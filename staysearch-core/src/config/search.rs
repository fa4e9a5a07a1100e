use super::defaults::{
    DEFAULT_ADULTS, DEFAULT_CHECK_IN, DEFAULT_CHECK_OUT, DEFAULT_LOCATION, DEFAULT_TOOL,
};
use super::error::ConfigError;
use crate::domain::SearchQuery;
use chrono::NaiveDate;
use serde::Deserialize;

/// Which tool to call and with what arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub tool: String,
    pub query: SearchQuery,
}

impl Default for SearchConfig {
    fn default() -> Self {
        let mut query = SearchQuery::new(DEFAULT_LOCATION).with_adults(DEFAULT_ADULTS);
        query.check_in = NaiveDate::parse_from_str(DEFAULT_CHECK_IN, "%Y-%m-%d").ok();
        query.check_out = NaiveDate::parse_from_str(DEFAULT_CHECK_OUT, "%Y-%m-%d").ok();
        Self {
            tool: DEFAULT_TOOL.to_string(),
            query,
        }
    }
}

/// Dates are quoted ISO strings (`check_in = "2025-06-28"`).
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawSearch {
    tool: Option<String>,
    location: Option<String>,
    check_in: Option<NaiveDate>,
    check_out: Option<NaiveDate>,
    min_price: Option<u32>,
    max_price: Option<u32>,
    adults: Option<u32>,
    children: Option<u32>,
    infants: Option<u32>,
    pets: Option<u32>,
    ignore_robots_text: Option<bool>,
}

impl TryFrom<RawSearch> for SearchConfig {
    type Error = ConfigError;

    fn try_from(raw: RawSearch) -> Result<Self, Self::Error> {
        let defaults = Self::default();
        let tool = raw.tool.unwrap_or(defaults.tool);
        if tool.trim().is_empty() {
            return Err(ConfigError::invalid("search.tool", "must not be empty"));
        }

        let mut query = SearchQuery::new(raw.location.unwrap_or(defaults.query.location));
        query.check_in = raw.check_in.or(defaults.query.check_in);
        query.check_out = raw.check_out.or(defaults.query.check_out);
        query.adults = raw.adults.or(defaults.query.adults);
        query.children = raw.children;
        query.infants = raw.infants;
        query.pets = raw.pets;
        query.ignore_robots_text = raw.ignore_robots_text;
        query = query.with_price_range(raw.min_price, raw.max_price);

        validate_query(&query)?;
        Ok(Self { tool, query })
    }
}

/// Checks the invariants a search query must hold before it is sent.
pub fn validate_query(query: &SearchQuery) -> Result<(), ConfigError> {
    if query.location.trim().is_empty() {
        return Err(ConfigError::invalid("search.location", "must not be empty"));
    }
    if let Some(nights) = query.nights() {
        if nights <= 0 {
            return Err(ConfigError::invalid(
                "search.check_out",
                "must be after check_in",
            ));
        }
    }
    let bound = |value: &Option<String>| value.as_deref().and_then(|v| v.parse::<u32>().ok());
    if let (Some(min), Some(max)) = (bound(&query.min_price), bound(&query.max_price)) {
        if min > max {
            return Err(ConfigError::invalid(
                "search.min_price",
                format!("{min} exceeds max_price {max}"),
            ));
        }
    }
    Ok(())
}
