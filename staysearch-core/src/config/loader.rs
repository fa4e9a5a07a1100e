use super::app::{AppConfig, ReportConfig};
use super::error::ConfigError;
use super::search::{RawSearch, SearchConfig};
use super::server::{RawServer, ServerDescriptor};
use super::session::{RawSessionOptions, SessionOptions};
use super::summarizer::{RawSummarizer, SummarizerConfig};
use crate::constants::{CONFIG_PATH, ENV_PATH};
use dotenvy::from_filename;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Once;
use tracing::{debug, info};

static ENV_LOADER: Once = Once::new();

/// Raw configuration structure for deserialization from TOML
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub(super) struct RawConfig {
    pub server: Option<RawServer>,
    #[serde(default)]
    pub session: RawSessionOptions,
    #[serde(default)]
    pub search: RawSearch,
    #[serde(default)]
    pub summarizer: RawSummarizer,
    #[serde(default)]
    pub report: RawReport,
}

#[derive(Debug, Deserialize, Default)]
pub(super) struct RawReport {
    pub limit: Option<usize>,
}

/// Ensures environment variables are loaded from config/.env
pub fn ensure_env_loaded() {
    ENV_LOADER.call_once(|| {
        if from_filename(ENV_PATH).is_ok() {
            debug!(path = ENV_PATH, "Loaded environment overrides");
        }
    });
}

/// Load and validate configuration.
///
/// An explicit path must exist. Without one, the default path is read when
/// present and built-in defaults are used otherwise.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    ensure_env_loaded();
    match path {
        Some(explicit) => read_config(explicit),
        None => {
            let default_path = Path::new(CONFIG_PATH);
            if default_path.exists() {
                read_config(default_path)
            } else {
                info!(
                    path = CONFIG_PATH,
                    "No configuration file found, using built-in defaults"
                );
                Ok(AppConfig::default())
            }
        }
    }
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    debug!(path = %path.display(), "Reading configuration file");

    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    parse_config(path, &content)
}

pub(super) fn parse_config(path: &Path, content: &str) -> Result<AppConfig, ConfigError> {
    let parsed: RawConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    validate_and_build(parsed)
}

fn validate_and_build(parsed: RawConfig) -> Result<AppConfig, ConfigError> {
    let server = match parsed.server {
        Some(raw) => ServerDescriptor::from(raw),
        None => ServerDescriptor::default(),
    };
    if server.command.as_os_str().is_empty() {
        return Err(ConfigError::invalid("server.command", "must not be empty"));
    }

    let limit = parsed.report.limit.unwrap_or(ReportConfig::default().limit);
    if limit == 0 {
        return Err(ConfigError::invalid(
            "report.limit",
            "must be greater than zero",
        ));
    }

    Ok(AppConfig {
        server,
        session: SessionOptions::try_from(parsed.session)?,
        search: SearchConfig::try_from(parsed.search)?,
        summarizer: SummarizerConfig::try_from(parsed.summarizer)?,
        report: ReportConfig { limit },
    })
}
