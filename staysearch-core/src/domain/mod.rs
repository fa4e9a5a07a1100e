mod listing;
mod query;

pub use listing::{ListingRecord, SearchResultSet};
pub use query::SearchQuery;
