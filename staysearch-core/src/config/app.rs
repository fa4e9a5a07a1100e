use super::defaults::DEFAULT_LIMIT;
use super::error::ConfigError;
use super::search::SearchConfig;
use super::server::ServerDescriptor;
use super::session::SessionOptions;
use super::summarizer::SummarizerConfig;
use std::path::Path;

/// Rendering settings shared by both report strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportConfig {
    /// How many listings to render.
    pub limit: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Application configuration loaded from staysearch.toml
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    pub server: ServerDescriptor,
    pub session: SessionOptions,
    pub search: SearchConfig,
    pub summarizer: SummarizerConfig,
    pub report: ReportConfig,
}

impl AppConfig {
    /// Load configuration from a file path (or default path if None)
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        super::loader::load_config(path)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        super::loader::parse_config(Path::new("<inline>"), content)
    }
}
