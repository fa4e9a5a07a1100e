pub const DEFAULT_SERVER_NAME: &str = "airbnb";
pub const DEFAULT_SERVER_COMMAND: &str = "npx";
pub const DEFAULT_SERVER_ARGS: &[&str] = &["-y", "@openbnb/mcp-server-airbnb", "--ignore-robots-txt"];

pub const DEFAULT_TOOL: &str = "airbnb_search";
pub const DEFAULT_LOCATION: &str = "Paris, France";
pub const DEFAULT_CHECK_IN: &str = "2025-06-28";
pub const DEFAULT_CHECK_OUT: &str = "2025-06-30";
pub const DEFAULT_ADULTS: u32 = 2;

pub const DEFAULT_HANDSHAKE_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 5;

pub const DEFAULT_LIMIT: usize = 5;

pub const DEFAULT_GENERATOR_ENDPOINT: &str = "https://api.anthropic.com";
pub const DEFAULT_GENERATOR_API_PATH: &str = "/v1/messages";
pub const DEFAULT_GENERATOR_MODEL: &str = "claude-3-opus-20240229";
pub const DEFAULT_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_GENERATOR_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant that formats vacation rental search results for a plain terminal, avoiding characters that might not display properly.";
