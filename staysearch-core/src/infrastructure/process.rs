//! Launching tool providers and exposing them as byte channels.

use crate::config::ServerDescriptor;
use crate::session::SessionError;
use async_trait::async_trait;
use std::fmt;
use std::io;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, Command};
use tracing::{debug, info};

pub type BoxReader = Box<dyn AsyncRead + Send + Unpin>;
pub type BoxWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Releases whatever backs a [`Channel`] once both halves are closed.
#[async_trait]
pub trait ChannelHandle: Send {
    async fn shutdown(&mut self) -> io::Result<()>;
}

/// A bidirectional byte channel to a tool provider.
pub struct Channel {
    pub reader: BoxReader,
    pub writer: BoxWriter,
    pub handle: Box<dyn ChannelHandle>,
}

impl Channel {
    pub fn new(
        reader: impl AsyncRead + Send + Unpin + 'static,
        writer: impl AsyncWrite + Send + Unpin + 'static,
        handle: impl ChannelHandle + 'static,
    ) -> Self {
        Self {
            reader: Box::new(reader),
            writer: Box::new(writer),
            handle: Box::new(handle),
        }
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel").finish_non_exhaustive()
    }
}

/// Produces a channel for a server descriptor.
#[async_trait]
pub trait Launcher: Send + Sync {
    async fn launch(&self, descriptor: &ServerDescriptor) -> Result<Channel, SessionError>;
}

/// Spawns the provider as a child process speaking over stdin/stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessLauncher;

#[async_trait]
impl Launcher for ProcessLauncher {
    async fn launch(&self, descriptor: &ServerDescriptor) -> Result<Channel, SessionError> {
        let mut command = Command::new(&descriptor.command);
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(dir) = &descriptor.workdir {
            command.current_dir(dir);
        }
        if !descriptor.args.is_empty() {
            command.args(&descriptor.args);
        }
        for (key, value) in &descriptor.env {
            command.env(key, value);
        }

        let mut child = command.spawn().map_err(|source| SessionError::Launch {
            server: descriptor.name.clone(),
            source,
        })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            SessionError::connection(&descriptor.name, "failed to capture provider stdin")
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            SessionError::connection(&descriptor.name, "failed to capture provider stdout")
        })?;

        info!(
            server = %descriptor.name,
            command = %descriptor.command.display(),
            pid = child.id(),
            "Launched tool provider"
        );

        Ok(Channel::new(
            stdout,
            stdin,
            ChildHandle {
                server: descriptor.name.clone(),
                child,
            },
        ))
    }
}

struct ChildHandle {
    server: String,
    child: Child,
}

#[async_trait]
impl ChannelHandle for ChildHandle {
    async fn shutdown(&mut self) -> io::Result<()> {
        if let Some(status) = self.child.try_wait()? {
            debug!(server = %self.server, %status, "Tool provider already exited");
            return Ok(());
        }
        if let Err(err) = self.child.kill().await {
            debug!(
                server = %self.server,
                %err,
                "failed to kill tool provider process (may have already exited)"
            );
        }
        let status = self.child.wait().await?;
        debug!(server = %self.server, %status, "Tool provider reaped");
        Ok(())
    }
}
