// Shared test fixtures - in-memory tool providers
//
// A `DuplexLauncher` hands the session one end of a `tokio::io::duplex`
// pipe and runs a scripted JSON-RPC provider on the other end.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Value, json};
use staysearch_core::ServerDescriptor;
use staysearch_core::process::{Channel, ChannelHandle, Launcher};
use staysearch_core::session::SessionError;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::task::JoinHandle;

/// How the fake provider answers one request.
pub enum Reply {
    Result(Value),
    Error(i64, String),
    /// Never answer.
    Silent,
    /// Write raw bytes, then answer with the result.
    Noisy(Vec<u8>, Value),
    /// Stop reading input for good while keeping the pipe open.
    Stall,
}

pub type Handler = Arc<dyn Fn(&str, &Value) -> Reply + Send + Sync>;

#[derive(Default)]
pub struct ProviderState {
    pub launches: AtomicUsize,
    pub released: AtomicBool,
    /// Every message the provider received, as (method, params).
    pub received: Mutex<Vec<(String, Value)>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ProviderState {
    pub fn methods(&self) -> Vec<String> {
        self.received
            .lock()
            .expect("lock")
            .iter()
            .map(|(method, _)| method.clone())
            .collect()
    }

    pub fn params_of(&self, method: &str) -> Vec<Value> {
        self.received
            .lock()
            .expect("lock")
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, params)| params.clone())
            .collect()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Kills the provider task, dropping its end of the pipe.
    pub fn abort_provider(&self) -> bool {
        match self.task.lock().expect("lock").take() {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }

    /// True once the provider saw end-of-stream and stopped.
    pub async fn provider_stopped(&self) -> bool {
        let task = self.task.lock().expect("lock").take();
        match task {
            Some(task) => tokio::time::timeout(Duration::from_secs(5), task)
                .await
                .is_ok(),
            None => false,
        }
    }
}

pub struct DuplexLauncher {
    handler: Handler,
    buffer: usize,
    hang_on_release: bool,
    pub state: Arc<ProviderState>,
}

impl DuplexLauncher {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&str, &Value) -> Reply + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
            buffer: 64 * 1024,
            hang_on_release: false,
            state: Arc::new(ProviderState::default()),
        }
    }

    /// Size of the in-memory pipe in each direction.
    pub fn with_buffer(mut self, bytes: usize) -> Self {
        self.buffer = bytes;
        self
    }

    /// Makes releasing the channel never complete.
    pub fn hanging_on_release(mut self) -> Self {
        self.hang_on_release = true;
        self
    }
}

#[async_trait]
impl Launcher for DuplexLauncher {
    async fn launch(&self, _descriptor: &ServerDescriptor) -> Result<Channel, SessionError> {
        self.state.launches.fetch_add(1, Ordering::SeqCst);
        let (client, provider) = tokio::io::duplex(self.buffer);
        let task = tokio::spawn(serve(
            provider,
            Arc::clone(&self.handler),
            Arc::clone(&self.state),
        ));
        *self.state.task.lock().expect("lock") = Some(task);

        let (reader, writer) = tokio::io::split(client);
        Ok(Channel::new(
            reader,
            writer,
            FakeHandle {
                state: Arc::clone(&self.state),
                hang: self.hang_on_release,
            },
        ))
    }
}

/// Launcher that always fails, as a missing command would.
pub struct FailingLauncher;

#[async_trait]
impl Launcher for FailingLauncher {
    async fn launch(&self, descriptor: &ServerDescriptor) -> Result<Channel, SessionError> {
        Err(SessionError::Launch {
            server: descriptor.name.clone(),
            source: io::Error::new(io::ErrorKind::NotFound, "command not found"),
        })
    }
}

struct FakeHandle {
    state: Arc<ProviderState>,
    hang: bool,
}

#[async_trait]
impl ChannelHandle for FakeHandle {
    async fn shutdown(&mut self) -> io::Result<()> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        self.state.released.store(true, Ordering::SeqCst);
        Ok(())
    }
}

async fn serve(io: DuplexStream, handler: Handler, state: Arc<ProviderState>) {
    let (read, mut write) = tokio::io::split(io);
    let mut lines = BufReader::new(read).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let Ok(message) = serde_json::from_str::<Value>(&line) else {
            continue;
        };
        let Some(method) = message.get("method").and_then(Value::as_str) else {
            continue;
        };
        let params = message.get("params").cloned().unwrap_or(Value::Null);
        state
            .received
            .lock()
            .expect("lock")
            .push((method.to_string(), params.clone()));

        let reply = handler(method, &params);
        if matches!(reply, Reply::Stall) {
            // Hold both halves so the client sees a full pipe, not EOF.
            let _held = (lines, write);
            std::future::pending::<()>().await;
            return;
        }
        let Some(id) = message.get("id").cloned() else {
            continue;
        };
        let response = match reply {
            Reply::Result(result) => json!({"jsonrpc": "2.0", "id": id, "result": result}),
            Reply::Noisy(noise, result) => {
                if write.write_all(&noise).await.is_err() {
                    break;
                }
                json!({"jsonrpc": "2.0", "id": id, "result": result})
            }
            Reply::Error(code, text) => json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": {"code": code, "message": text}
            }),
            Reply::Silent | Reply::Stall => continue,
        };
        let mut encoded = response.to_string();
        encoded.push('\n');
        if write.write_all(encoded.as_bytes()).await.is_err() {
            break;
        }
        let _ = write.flush().await;
    }
}

pub fn descriptor() -> ServerDescriptor {
    ServerDescriptor::new("airbnb", "fake-airbnb-provider")
}

pub fn initialize_result() -> Value {
    json!({
        "protocolVersion": "2025-06-18",
        "serverInfo": {"name": "airbnb", "version": "0.1.3"},
        "capabilities": {"tools": {}}
    })
}

pub fn tool_list() -> Value {
    json!({
        "tools": [
            {
                "name": "airbnb_search",
                "description": "Search for Airbnb listings with various filters",
                "inputSchema": {"type": "object", "required": ["location"]}
            },
            {
                "name": "airbnb_listing_details",
                "description": "Get detailed information about a specific Airbnb listing"
            }
        ]
    })
}

pub fn listing(title: &str, id: u32, price: Option<&str>, rating: Option<&str>) -> Value {
    let mut value = json!({
        "id": id.to_string(),
        "url": format!("https://www.airbnb.com/rooms/{id}"),
        "listing": {"id": id.to_string(), "title": title}
    });
    if let Some(price) = price {
        value["structuredDisplayPrice"] = json!({
            "primaryLine": {"accessibilityLabel": price}
        });
    }
    if let Some(rating) = rating {
        value["avgRatingA11yLabel"] = json!(rating);
    }
    value
}

pub fn search_payload(listings: Vec<Value>) -> Value {
    json!({
        "searchUrl": "https://www.airbnb.com/s/Paris--France/homes",
        "searchResults": listings
    })
}

/// A provider that handshakes, lists two tools and answers `airbnb_search`
/// with `payload` as text content.
pub fn airbnb_provider(payload: Value) -> DuplexLauncher {
    let text = payload.to_string();
    DuplexLauncher::new(move |method, params| match method {
        "initialize" => Reply::Result(initialize_result()),
        "tools/list" => Reply::Result(tool_list()),
        "tools/call" => match params.get("name").and_then(Value::as_str) {
            Some("airbnb_search") => Reply::Result(json!({
                "content": [{"type": "text", "text": text}],
                "isError": false
            })),
            other => Reply::Error(-32602, format!("Unknown tool: {}", other.unwrap_or(""))),
        },
        _ => Reply::Error(-32601, format!("Method not found: {method}")),
    })
}
