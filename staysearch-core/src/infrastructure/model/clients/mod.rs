//! HTTP model client implementations

mod anthropic;
mod base;

pub use anthropic::AnthropicClient;
pub use base::HttpClientBase;
