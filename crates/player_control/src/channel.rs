use std::{fmt, io, sync::Arc, time::Duration};

use async_trait::async_trait;
use shared::{domain::ControlCommand, protocol::command_line};
use thiserror::Error;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    task::JoinHandle,
    time::timeout,
};
use tracing::{debug, warn};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(1);
const REPLY_BUF_LEN: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlEndpoint {
    pub host: String,
    pub port: u16,
}

impl ControlEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for ControlEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("connect to {endpoint} failed: {source}")]
    Connect {
        endpoint: String,
        source: io::Error,
    },
    #[error("connect to {endpoint} timed out after {after:?}")]
    ConnectTimeout { endpoint: String, after: Duration },
    #[error("control channel i/o with {endpoint} failed: {source}")]
    Io {
        endpoint: String,
        source: io::Error,
    },
}

/// Anything that can carry a [`ControlCommand`] to the player.
///
/// Implementations must not retry: a failed command is reported and dropped.
#[async_trait]
pub trait CommandSink: Send + Sync {
    async fn deliver(&self, command: ControlCommand) -> Result<(), DeliveryError>;
}

/// Short-lived connection per command against the player's rc port.
#[derive(Debug, Clone)]
pub struct ControlChannelClient {
    endpoint: ControlEndpoint,
    connect_timeout: Duration,
    reply_timeout: Duration,
}

impl ControlChannelClient {
    pub fn new(endpoint: ControlEndpoint) -> Self {
        Self {
            endpoint,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, connect_timeout: Duration, reply_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.reply_timeout = reply_timeout;
        self
    }

    pub fn endpoint(&self) -> &ControlEndpoint {
        &self.endpoint
    }

    /// Sends one raw command, e.g. `"volume 120"`. A trailing newline is added.
    pub async fn send(&self, command: &str) -> Result<(), DeliveryError> {
        self.exchange(&format!("{}\n", command.trim_end())).await
    }

    /// Connects and immediately hangs up. Used to detect the port opening.
    pub async fn check_reachable(&self) -> Result<(), DeliveryError> {
        self.open().await.map(drop)
    }

    async fn exchange(&self, line: &str) -> Result<(), DeliveryError> {
        let mut stream = self.open().await?;
        self.discard_reply(&mut stream).await?;
        stream
            .write_all(line.as_bytes())
            .await
            .map_err(|source| self.io_error(source))?;
        self.discard_reply(&mut stream).await?;
        let _ = stream.shutdown().await;
        debug!(endpoint = %self.endpoint, command = line.trim_end(), "delivered control command");
        Ok(())
    }

    async fn open(&self) -> Result<TcpStream, DeliveryError> {
        let target = (self.endpoint.host.as_str(), self.endpoint.port);
        match timeout(self.connect_timeout, TcpStream::connect(target)).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(source)) => Err(DeliveryError::Connect {
                endpoint: self.endpoint.to_string(),
                source,
            }),
            Err(_) => Err(DeliveryError::ConnectTimeout {
                endpoint: self.endpoint.to_string(),
                after: self.connect_timeout,
            }),
        }
    }

    /// Reads whatever the player has to say (banner or acknowledgement) and
    /// throws it away. Silence within the reply timeout is not an error.
    async fn discard_reply(&self, stream: &mut TcpStream) -> Result<(), DeliveryError> {
        let mut buf = [0u8; REPLY_BUF_LEN];
        match timeout(self.reply_timeout, stream.read(&mut buf)).await {
            Ok(Ok(_)) | Err(_) => Ok(()),
            Ok(Err(source)) => Err(self.io_error(source)),
        }
    }

    fn io_error(&self, source: io::Error) -> DeliveryError {
        DeliveryError::Io {
            endpoint: self.endpoint.to_string(),
            source,
        }
    }
}

#[async_trait]
impl CommandSink for ControlChannelClient {
    async fn deliver(&self, command: ControlCommand) -> Result<(), DeliveryError> {
        self.exchange(&command_line(&command)).await
    }
}

/// Fire-and-forget delivery. Failures are logged as drops and never retried.
pub fn dispatch(sink: &Arc<dyn CommandSink>, command: ControlCommand) -> JoinHandle<()> {
    let sink = Arc::clone(sink);
    tokio::spawn(async move {
        if let Err(error) = sink.deliver(command).await {
            warn!(command = %command, %error, "dropped control command");
        }
    })
}

#[cfg(test)]
#[path = "tests/channel_tests.rs"]
mod tests;
