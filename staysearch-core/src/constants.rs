//! Application constants
//!
//! Single source of truth for paths and protocol identifiers.

/// Default configuration file path
pub const CONFIG_PATH: &str = "config/staysearch.toml";

/// Default environment file path
pub const ENV_PATH: &str = "config/.env";

/// MCP protocol revision sent during the handshake
pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// JSON-RPC version tag carried by every message
pub const JSONRPC_VERSION: &str = "2.0";

/// Width of the rule lines in the direct report
pub const RULE_WIDTH: usize = 60;

/// Shown when a listing carries no rating label
pub const NO_RATING: &str = "No ratings yet";

/// Shown when a listing carries no price block
pub const NO_PRICE: &str = "Price not available";
