//! # Session Client
//!
//! One [`Session`] owns one channel to a tool provider. The lifecycle is
//! `open` → `initialize` → any number of `discover`/`invoke` → `close`.
//! [`with_session`] runs a body against an opened session and closes it on
//! every exit path.
//!
//! Payload decoding is left to the caller: content items come back as
//! typed but opaque [`InvocationResult`] values.

mod channel;
mod error;

pub use crate::rpc::{ContentItem, InvocationRequest, InvocationResult, ToolDescriptor};
pub use error::SessionError;

use crate::config::{ServerDescriptor, SessionOptions};
use crate::constants::PROTOCOL_VERSION;
use crate::infrastructure::process::{Channel, ChannelHandle, Launcher};
use crate::rpc::{CallToolParams, InitializeResult, ListToolsResult};
use channel::{RequestError, RpcChannel};
use futures::future::BoxFuture;
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// What the provider reported about itself during the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
    pub protocol_version: String,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Connected,
    Initializing,
    Initialized,
    HandshakeFailed,
    Closed,
}

/// A live, exclusively owned connection to one tool provider.
pub struct Session {
    server: String,
    options: SessionOptions,
    channel: Arc<RpcChannel>,
    phase: AsyncMutex<Phase>,
    server_info: AsyncMutex<Option<ServerInfo>>,
    handle: AsyncMutex<Option<Box<dyn ChannelHandle>>>,
    reader_task: JoinHandle<()>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("server", &self.server)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Launches the provider and starts reading from its channel.
    pub async fn open<L>(
        launcher: &L,
        descriptor: &ServerDescriptor,
        options: SessionOptions,
    ) -> Result<Self, SessionError>
    where
        L: Launcher + ?Sized,
    {
        let Channel {
            reader,
            writer,
            handle,
        } = launcher.launch(descriptor).await?;

        let channel = RpcChannel::new(descriptor.name.clone(), writer);
        let reader_task = tokio::spawn(Arc::clone(&channel).reader_loop(reader));
        debug!(server = %descriptor.name, "Session opened");

        Ok(Self {
            server: descriptor.name.clone(),
            options,
            channel,
            phase: AsyncMutex::new(Phase::Connected),
            server_info: AsyncMutex::new(None),
            handle: AsyncMutex::new(Some(handle)),
            reader_task,
        })
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub async fn server_info(&self) -> Option<ServerInfo> {
        self.server_info.lock().await.clone()
    }

    /// Performs the protocol handshake. Valid exactly once per session.
    pub async fn initialize(&self) -> Result<ServerInfo, SessionError> {
        {
            let mut phase = self.phase.lock().await;
            match *phase {
                Phase::Connected => *phase = Phase::Initializing,
                Phase::Closed => return Err(self.closed_error()),
                Phase::HandshakeFailed => {
                    return Err(SessionError::protocol(
                        &self.server,
                        "handshake already failed on this session",
                    ));
                }
                Phase::Initializing | Phase::Initialized => {
                    return Err(SessionError::protocol(
                        &self.server,
                        "session is already initialized",
                    ));
                }
            }
        }

        let outcome = self.handshake().await;
        let mut phase = self.phase.lock().await;
        match outcome {
            Ok(info) => {
                if *phase == Phase::Closed {
                    return Err(self.closed_error());
                }
                *phase = Phase::Initialized;
                *self.server_info.lock().await = Some(info.clone());
                info!(
                    server = %self.server,
                    provider = %info.name,
                    version = %info.version,
                    protocol = %info.protocol_version,
                    "Session initialized"
                );
                Ok(info)
            }
            Err(err) => {
                if *phase != Phase::Closed {
                    *phase = Phase::HandshakeFailed;
                }
                Err(err)
            }
        }
    }

    async fn handshake(&self) -> Result<ServerInfo, SessionError> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
                "title": "staysearch"
            },
            "capabilities": {}
        });

        let value = self
            .channel
            .request("initialize", params, self.options.handshake_timeout)
            .await
            .map_err(|err| match err {
                RequestError::Rpc(rpc) => SessionError::protocol(
                    &self.server,
                    format!("handshake rejected (code {}): {}", rpc.code, rpc.message),
                ),
                RequestError::TimedOut(elapsed) => SessionError::protocol(
                    &self.server,
                    format!("no handshake response within {elapsed:?}"),
                ),
                RequestError::Session(err) => err,
            })?;

        let result: InitializeResult = serde_json::from_value(value).map_err(|source| {
            SessionError::protocol(&self.server, format!("malformed initialize result: {source}"))
        })?;
        if result.protocol_version.trim().is_empty() {
            return Err(SessionError::protocol(
                &self.server,
                "initialize result carries no protocol version",
            ));
        }
        if result.protocol_version != PROTOCOL_VERSION {
            debug!(
                server = %self.server,
                requested = PROTOCOL_VERSION,
                negotiated = %result.protocol_version,
                "Provider negotiated a different protocol version"
            );
        }

        self.channel
            .notify(
                "notifications/initialized",
                json!({}),
                self.options.handshake_timeout,
            )
            .await?;

        Ok(ServerInfo {
            name: result.server_info.name,
            version: result.server_info.version,
            protocol_version: result.protocol_version,
            instructions: result.instructions,
        })
    }

    /// Lists the provider's tools, following pagination cursors.
    pub async fn discover(&self) -> Result<Vec<ToolDescriptor>, SessionError> {
        self.require_initialized().await?;

        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;
        let mut seen = HashSet::new();
        loop {
            let params = match &cursor {
                Some(cursor) => json!({ "cursor": cursor }),
                None => json!({}),
            };
            let value = self
                .channel
                .request("tools/list", params, self.options.request_timeout)
                .await
                .map_err(|err| self.request_error("tools/list", err))?;
            let page: ListToolsResult = serde_json::from_value(value).map_err(|source| {
                SessionError::protocol(&self.server, format!("malformed tools/list result: {source}"))
            })?;
            tools.extend(page.tools);

            match page.next_cursor {
                Some(next) if next.is_empty() => break,
                Some(next) if !seen.insert(next.clone()) => {
                    warn!(
                        server = %self.server,
                        cursor = %next,
                        "tool provider repeated a pagination cursor; stopping discovery"
                    );
                    break;
                }
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        debug!(server = %self.server, count = tools.len(), "Discovered tools");
        Ok(tools)
    }

    /// Calls one named tool and waits for its result.
    ///
    /// A timeout only fails this call: the request is forgotten and the
    /// session stays usable.
    pub async fn invoke(
        &self,
        request: &InvocationRequest,
    ) -> Result<InvocationResult, SessionError> {
        if request.name.trim().is_empty() {
            return Err(SessionError::invocation(
                &self.server,
                "",
                None,
                "operation name must not be empty",
            ));
        }
        self.require_initialized().await?;

        info!(
            server = %self.server,
            operation = %request.name,
            arguments = %request.summary(),
            "Invoking tool"
        );
        let params = serde_json::to_value(CallToolParams::from(request)).map_err(|source| {
            SessionError::invocation(&self.server, &request.name, None, source.to_string())
        })?;
        let value = self
            .channel
            .request("tools/call", params, self.options.request_timeout)
            .await
            .map_err(|err| self.request_error(&request.name, err))?;

        let result: InvocationResult = serde_json::from_value(value).map_err(|source| {
            SessionError::protocol(&self.server, format!("malformed tools/call result: {source}"))
        })?;
        if result.is_error {
            let message = result.joined_text();
            let message = if message.trim().is_empty() {
                "tool reported an error without details".to_string()
            } else {
                message
            };
            return Err(SessionError::invocation(
                &self.server,
                &request.name,
                None,
                message,
            ));
        }

        debug!(
            server = %self.server,
            operation = %request.name,
            items = result.content.len(),
            "Tool returned"
        );
        Ok(result)
    }

    /// Releases the channel and the provider. Calling it again is a no-op.
    ///
    /// Calls still waiting on the provider fail with a connection error.
    /// Each release step is bounded by `shutdown_timeout`.
    pub async fn close(&self) {
        {
            let mut phase = self.phase.lock().await;
            if *phase == Phase::Closed {
                debug!(server = %self.server, "Session already closed");
                return;
            }
            *phase = Phase::Closed;
        }

        self.channel
            .shutdown("session closed", self.options.shutdown_timeout)
            .await;
        self.reader_task.abort();

        let handle = self.handle.lock().await.take();
        let Some(mut handle) = handle else {
            return;
        };
        match timeout(self.options.shutdown_timeout, handle.shutdown()).await {
            Ok(Ok(())) => info!(server = %self.server, "Session closed"),
            Ok(Err(err)) => warn!(
                server = %self.server,
                %err,
                "failed to release tool provider cleanly"
            ),
            Err(_) => warn!(
                server = %self.server,
                timeout = ?self.options.shutdown_timeout,
                "tool provider did not exit in time and may be leaked"
            ),
        }
    }

    pub async fn is_closed(&self) -> bool {
        *self.phase.lock().await == Phase::Closed
    }

    async fn require_initialized(&self) -> Result<(), SessionError> {
        match *self.phase.lock().await {
            Phase::Initialized => Ok(()),
            Phase::Closed => Err(self.closed_error()),
            Phase::Connected | Phase::Initializing | Phase::HandshakeFailed => Err(
                SessionError::protocol(&self.server, "session has not been initialized"),
            ),
        }
    }

    fn request_error(&self, operation: &str, err: RequestError) -> SessionError {
        match err {
            RequestError::Rpc(rpc) => {
                SessionError::invocation(&self.server, operation, Some(rpc.code), rpc.message)
            }
            RequestError::TimedOut(elapsed) => SessionError::Timeout {
                server: self.server.clone(),
                operation: operation.to_string(),
                elapsed,
            },
            RequestError::Session(err) => err,
        }
    }

    fn closed_error(&self) -> SessionError {
        SessionError::connection(&self.server, "session is closed")
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.reader_task.abort();
        if let Ok(phase) = self.phase.try_lock() {
            if *phase != Phase::Closed {
                debug!(
                    server = %self.server,
                    "Session dropped without close; provider is killed on drop"
                );
            }
        }
    }
}

/// Opens a session, runs `body` against it and closes it whatever the
/// outcome.
pub async fn with_session<L, T, E, F>(
    launcher: &L,
    descriptor: &ServerDescriptor,
    options: SessionOptions,
    body: F,
) -> Result<T, E>
where
    L: Launcher + ?Sized,
    E: From<SessionError>,
    F: for<'s> FnOnce(&'s Session) -> BoxFuture<'s, Result<T, E>>,
{
    let session = Session::open(launcher, descriptor, options).await?;
    let outcome = body(&session).await;
    session.close().await;
    outcome
}

/// Builds an [`InvocationRequest`] from any serializable argument value.
///
/// Only JSON objects are accepted as argument maps.
pub fn request_from<T: serde::Serialize>(
    name: impl Into<String>,
    arguments: &T,
) -> Result<InvocationRequest, serde_json::Error> {
    let name = name.into();
    match serde_json::to_value(arguments)? {
        Value::Object(map) => Ok(InvocationRequest::new(name, map)),
        Value::Null => Ok(InvocationRequest::new(name, serde_json::Map::new())),
        other => Err(serde::ser::Error::custom(format!(
            "arguments must serialize to an object, got {other}"
        ))),
    }
}
