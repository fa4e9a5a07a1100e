//! Model types - Request, Message, and Error types

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// One text-generation call.
#[derive(Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system: String,
    pub messages: Vec<ChatMessage>,
    pub api_key: String,
}

impl std::fmt::Debug for GenerationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationRequest")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("messages", &self.messages.len())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Model errors
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to build HTTP client for '{provider}': {source}")]
    Client {
        provider: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("network error calling '{provider}': {source}")]
    Network {
        provider: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("'{provider}' returned status {status}: {message}")]
    Status {
        provider: String,
        status: StatusCode,
        message: String,
    },
    #[error("'{provider}' returned invalid response: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

impl ModelError {
    pub fn network(provider: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            provider: provider.into(),
            source,
        }
    }

    pub fn invalid_response(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    /// Short diagnostic suitable for terminal output.
    pub fn user_message(&self) -> String {
        match self {
            ModelError::Client { provider, .. } => {
                format!("Could not set up a client for '{provider}'.")
            }
            ModelError::Network { provider, source } => {
                if source.is_connect() {
                    format!("Could not connect to '{provider}'.")
                } else if source.is_timeout() {
                    format!("Request to '{provider}' timed out.")
                } else {
                    format!("Network error talking to '{provider}'.")
                }
            }
            ModelError::Status {
                provider, status, ..
            } => match *status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    format!("'{provider}' rejected the API key.")
                }
                StatusCode::TOO_MANY_REQUESTS => format!("'{provider}' is rate limiting requests."),
                StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
                    format!("'{provider}' is temporarily unavailable.")
                }
                other => format!("'{provider}' failed with status {}.", other.as_u16()),
            },
            ModelError::InvalidResponse { provider, .. } => {
                format!("'{provider}' returned a response that could not be read.")
            }
        }
    }
}
