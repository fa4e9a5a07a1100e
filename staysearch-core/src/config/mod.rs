pub mod app;
pub mod defaults;
pub mod error;
pub mod loader;
pub mod search;
pub mod server;
pub mod session;
pub mod summarizer;

pub use app::{AppConfig, ReportConfig};
pub use error::ConfigError;
pub use loader::ensure_env_loaded;
pub use search::{SearchConfig, validate_query};
pub use server::ServerDescriptor;
pub use session::SessionOptions;
pub use summarizer::SummarizerConfig;
