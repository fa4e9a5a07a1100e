use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to launch tool provider '{server}': {source}")]
    Launch {
        server: String,
        #[source]
        source: std::io::Error,
    },
    #[error("tool provider '{server}' connection error: {message}")]
    Connection { server: String, message: String },
    #[error("tool provider '{server}' protocol error: {message}")]
    Protocol { server: String, message: String },
    #[error("tool provider '{server}' rejected '{operation}': {message}")]
    Invocation {
        server: String,
        operation: String,
        code: Option<i64>,
        message: String,
    },
    #[error("'{operation}' on tool provider '{server}' timed out after {elapsed:?}")]
    Timeout {
        server: String,
        operation: String,
        elapsed: Duration,
    },
}

impl SessionError {
    pub fn connection(server: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            server: server.into(),
            message: message.into(),
        }
    }

    pub fn protocol(server: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Protocol {
            server: server.into(),
            message: message.into(),
        }
    }

    pub fn invocation(
        server: impl Into<String>,
        operation: impl Into<String>,
        code: Option<i64>,
        message: impl Into<String>,
    ) -> Self {
        Self::Invocation {
            server: server.into(),
            operation: operation.into(),
            code,
            message: message.into(),
        }
    }

    /// Session-level failures end the session; per-call failures leave it
    /// usable.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Launch { .. } | Self::Connection { .. } | Self::Protocol { .. }
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
