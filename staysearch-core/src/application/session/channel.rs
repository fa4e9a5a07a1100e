use super::error::SessionError;
use crate::infrastructure::process::{BoxReader, BoxWriter};
use crate::rpc::{Inbound, RpcError, RpcNotification, RpcRequest, RpcResponse};
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{Mutex as AsyncMutex, oneshot};
use tokio::time::timeout;
use tracing::{debug, warn};

type Reply = Result<Result<Value, RpcError>, SessionError>;

/// Why a single request did not produce a result.
#[derive(Debug)]
pub(super) enum RequestError {
    Rpc(RpcError),
    TimedOut(Duration),
    Session(SessionError),
}

/// JSON-RPC over a line-delimited byte channel.
///
/// Responses are routed to waiting callers by request id from a background
/// reader task.
pub(super) struct RpcChannel {
    server: String,
    writer: AsyncMutex<Option<BoxWriter>>,
    pending: AsyncMutex<HashMap<String, oneshot::Sender<Reply>>>,
    id_counter: AtomicU64,
    disconnected: AtomicBool,
}

impl RpcChannel {
    pub(super) fn new(server: String, writer: BoxWriter) -> Arc<Self> {
        Arc::new(Self {
            server,
            writer: AsyncMutex::new(Some(writer)),
            pending: AsyncMutex::new(HashMap::new()),
            id_counter: AtomicU64::new(1),
            disconnected: AtomicBool::new(false),
        })
    }

    /// Sends one request and waits for its reply. `limit` bounds the write
    /// and the wait together; a failed call never leaves an entry behind.
    pub(super) async fn request(
        self: &Arc<Self>,
        method: &str,
        params: Value,
        limit: Duration,
    ) -> Result<Value, RequestError> {
        let id = self.next_id();
        let (tx, mut rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            if self.disconnected.load(Ordering::SeqCst) {
                return Err(RequestError::Session(self.closed_error()));
            }
            pending.insert(id.clone(), tx);
        }

        debug!(server = %self.server, request_id = %id, method, "Sending request");
        let message = RpcRequest::new(id.clone(), method, params);
        let mut written = false;
        let exchange = async {
            // A close while the write is stuck resolves `rx` first.
            tokio::select! {
                sent = self.write_message(&message) => sent.map_err(RequestError::Session)?,
                reply = &mut rx => return self.settle(reply),
            }
            written = true;
            self.settle((&mut rx).await)
        };
        let outcome = timeout(limit, exchange).await;

        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                self.pending.lock().await.remove(&id);
                Err(err)
            }
            Err(_) => {
                self.pending.lock().await.remove(&id);
                if written {
                    self.abandon(id, limit);
                } else {
                    warn!(
                        server = %self.server,
                        request_id = %id,
                        timeout = ?limit,
                        "tool provider stopped reading its input"
                    );
                }
                Err(RequestError::TimedOut(limit))
            }
        }
    }

    fn settle(
        &self,
        reply: Result<Reply, oneshot::error::RecvError>,
    ) -> Result<Value, RequestError> {
        match reply {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(rpc))) => Err(RequestError::Rpc(rpc)),
            Ok(Err(err)) => Err(RequestError::Session(err)),
            Err(_) => Err(RequestError::Session(self.closed_error())),
        }
    }

    /// Sends a notification, failing with a connection error when the
    /// provider does not take it within `limit`.
    pub(super) async fn notify(
        &self,
        method: &str,
        params: Value,
        limit: Duration,
    ) -> Result<(), SessionError> {
        timeout(limit, self.write_message(&RpcNotification::new(method, params)))
            .await
            .unwrap_or_else(|_| {
                Err(SessionError::connection(
                    &self.server,
                    format!("provider did not accept '{method}' within {limit:?}"),
                ))
            })
    }

    /// Tells the provider it may stop working on a timed-out request. A late
    /// reply finds no pending entry and is dropped.
    fn abandon(self: &Arc<Self>, id: String, limit: Duration) {
        let channel = Arc::clone(self);
        tokio::spawn(async move {
            let params = json!({
                "requestId": id.clone(),
                "reason": format!("no response within {limit:?}"),
            });
            if let Err(err) = channel
                .notify("notifications/cancelled", params, limit)
                .await
            {
                debug!(server = %channel.server, request_id = %id, %err, "failed to send cancellation");
            }
        });
    }

    pub(super) async fn reader_loop(self: Arc<Self>, reader: BoxReader) {
        let mut reader = BufReader::new(reader);
        let mut line = Vec::new();
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(err) => {
                    warn!(server = %self.server, %err, "failed to read from tool provider");
                    break;
                }
            }
            let Ok(raw) = std::str::from_utf8(&line) else {
                let lossy = String::from_utf8_lossy(&line);
                warn!(
                    server = %self.server,
                    line = %lossy.trim(),
                    "skipping non-UTF-8 line from tool provider"
                );
                continue;
            };
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('\u{1b}') {
                debug!(
                    server = %self.server,
                    line = trimmed,
                    "skipping non-JSON ANSI log line from tool provider"
                );
                continue;
            }
            match serde_json::from_str::<Value>(trimmed) {
                Ok(value) => self.dispatch(Inbound::classify(value)).await,
                Err(source) => {
                    warn!(
                        server = %self.server,
                        line = trimmed,
                        %source,
                        "received invalid JSON from tool provider"
                    );
                }
            }
        }

        debug!(server = %self.server, "Tool provider channel reached end of stream");
        self.fail_all_pending("tool provider closed the channel").await;
    }

    async fn dispatch(&self, message: Inbound) {
        match message {
            Inbound::Response { id, outcome } => {
                let responder = self.pending.lock().await.remove(&id);
                match responder {
                    Some(sender) => {
                        let _ = sender.send(Ok(outcome));
                    }
                    None => debug!(
                        server = %self.server,
                        response_id = %id,
                        "received response for unknown request"
                    ),
                }
            }
            Inbound::Request { id, method, .. } => {
                let response = if method == "ping" {
                    RpcResponse::success(id, json!({}))
                } else {
                    warn!(
                        server = %self.server,
                        method = %method,
                        "tool provider sent unsupported request"
                    );
                    RpcResponse::method_not_found(id, &method)
                };
                if let Err(err) = self.write_message(&response).await {
                    warn!(server = %self.server, %err, "failed to answer tool provider request");
                }
            }
            Inbound::Notification { method, params } => {
                debug!(
                    server = %self.server,
                    method = %method,
                    %params,
                    "received notification from tool provider"
                );
            }
            Inbound::Unrecognized => {
                debug!(server = %self.server, "ignoring unrecognized message");
            }
        }
    }

    /// Fails every call still waiting, then closes the write side within
    /// `limit`.
    pub(super) async fn shutdown(&self, reason: &str, limit: Duration) {
        self.fail_all_pending(reason).await;

        let release = async {
            match self.writer.lock().await.take() {
                Some(mut stream) => stream.shutdown().await,
                None => Ok(()),
            }
        };
        match timeout(limit, release).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                debug!(server = %self.server, %err, "failed to shut down provider input");
            }
            Err(_) => warn!(
                server = %self.server,
                timeout = ?limit,
                "provider input could not be closed in time"
            ),
        }
    }

    async fn fail_all_pending(&self, reason: &str) {
        let mut pending = self.pending.lock().await;
        self.disconnected.store(true, Ordering::SeqCst);
        for (id, sender) in pending.drain() {
            debug!(server = %self.server, request_id = %id, reason, "aborting pending request");
            let _ = sender.send(Err(SessionError::connection(&self.server, reason)));
        }
    }

    async fn write_message<T: Serialize>(&self, message: &T) -> Result<(), SessionError> {
        let mut encoded = serde_json::to_string(message).map_err(|source| {
            SessionError::protocol(&self.server, format!("failed to encode message: {source}"))
        })?;
        encoded.push('\n');

        let mut writer = self.writer.lock().await;
        let stream = writer
            .as_mut()
            .ok_or_else(|| self.closed_error())?;
        stream
            .write_all(encoded.as_bytes())
            .await
            .map_err(|source| SessionError::connection(&self.server, source.to_string()))?;
        stream
            .flush()
            .await
            .map_err(|source| SessionError::connection(&self.server, source.to_string()))?;
        Ok(())
    }

    fn next_id(&self) -> String {
        let id = self.id_counter.fetch_add(1, Ordering::SeqCst);
        format!("req-{id}")
    }

    fn closed_error(&self) -> SessionError {
        SessionError::connection(&self.server, "channel is closed")
    }
}
