use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value};

/// Arguments of one listing search, serialized with the provider's
/// camelCase field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_out: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adults: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infants: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pets: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_robots_text: Option<bool>,
}

impl SearchQuery {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            check_in: None,
            check_out: None,
            min_price: None,
            max_price: None,
            adults: None,
            children: None,
            infants: None,
            pets: None,
            cursor: None,
            ignore_robots_text: None,
        }
    }

    pub fn with_dates(mut self, check_in: NaiveDate, check_out: NaiveDate) -> Self {
        self.check_in = Some(check_in);
        self.check_out = Some(check_out);
        self
    }

    pub fn with_price_range(mut self, min: Option<u32>, max: Option<u32>) -> Self {
        self.min_price = min.map(|v| v.to_string());
        self.max_price = max.map(|v| v.to_string());
        self
    }

    pub fn with_adults(mut self, adults: u32) -> Self {
        self.adults = Some(adults);
        self
    }

    /// Number of nights between check-in and check-out, when both are set.
    pub fn nights(&self) -> Option<i64> {
        match (self.check_in, self.check_out) {
            (Some(start), Some(end)) => Some((end - start).num_days()),
            _ => None,
        }
    }

    /// Converts the query into the argument map of a `tools/call` request.
    pub fn to_arguments(&self) -> JsonMap<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => JsonMap::new(),
        }
    }
}
