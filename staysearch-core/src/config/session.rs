use super::defaults::{
    DEFAULT_HANDSHAKE_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};
use super::error::ConfigError;
use serde::Deserialize;
use std::time::Duration;

/// Time bounds applied by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Upper bound for the `initialize` round trip.
    pub handshake_timeout: Duration,
    /// Upper bound for each `tools/list` and `tools/call` round trip.
    pub request_timeout: Duration,
    /// How long `close` waits for the provider to be reaped.
    pub shutdown_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(DEFAULT_HANDSHAKE_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
        }
    }
}

impl SessionOptions {
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawSessionOptions {
    handshake_timeout_secs: Option<u64>,
    request_timeout_secs: Option<u64>,
    shutdown_timeout_secs: Option<u64>,
}

impl TryFrom<RawSessionOptions> for SessionOptions {
    type Error = ConfigError;

    fn try_from(raw: RawSessionOptions) -> Result<Self, Self::Error> {
        let defaults = Self::default();
        let seconds = |field: &'static str, value: Option<u64>, fallback: Duration| match value {
            Some(0) => Err(ConfigError::invalid(field, "must be greater than zero")),
            Some(secs) => Ok(Duration::from_secs(secs)),
            None => Ok(fallback),
        };

        Ok(Self {
            handshake_timeout: seconds(
                "session.handshake_timeout_secs",
                raw.handshake_timeout_secs,
                defaults.handshake_timeout,
            )?,
            request_timeout: seconds(
                "session.request_timeout_secs",
                raw.request_timeout_secs,
                defaults.request_timeout,
            )?,
            shutdown_timeout: seconds(
                "session.shutdown_timeout_secs",
                raw.shutdown_timeout_secs,
                defaults.shutdown_timeout,
            )?,
        })
    }
}
