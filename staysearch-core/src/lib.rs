//! Tool-invocation client for stdio search providers.
//!
//! A [`session::Session`] launches a tool provider, performs the MCP
//! handshake, discovers its tools and invokes one. The decoded
//! [`domain::SearchResultSet`] is then rendered either directly by
//! [`report`] or through an external text-generation service by
//! [`summary`].

pub mod application;
pub mod config;
pub mod constants;
pub mod domain;
pub mod infrastructure;

pub use application::{extract, report, session, summary};
pub use config::{AppConfig, ConfigError, ServerDescriptor};
pub use domain::{ListingRecord, SearchQuery, SearchResultSet};
pub use infrastructure::{model, process, rpc};
