//! Frame relay transport.
//!
//! A bridge process owns the radio, and this side talks to it over TCP:
//! after a `subscribe <device_id> <data_channel>` line the relay streams each
//! notification as a one-byte length followed by the payload. A clean EOF is
//! the device disconnecting.

use std::{io, time::Duration};

use async_trait::async_trait;
use futures::{stream, StreamExt};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader},
    net::TcpStream,
    time::timeout,
};
use tracing::debug;

use crate::{FrameStream, LinkError, SensorConnector, SensorTarget};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct RelayConnector {
    addr: String,
    connect_timeout: Duration,
}

impl RelayConnector {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }
}

#[async_trait]
impl SensorConnector for RelayConnector {
    async fn open(&self, target: &SensorTarget) -> Result<FrameStream, LinkError> {
        let unreachable = |reason: String| LinkError::Unreachable {
            device_id: target.device_id.clone(),
            reason,
        };

        let socket = timeout(self.connect_timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| unreachable(format!("relay {} connect timed out", self.addr)))?
            .map_err(|err| unreachable(format!("relay {}: {err}", self.addr)))?;

        let (reader, mut writer) = socket.into_split();
        let subscribe = format!("subscribe {} {}\n", target.device_id, target.data_channel);
        writer
            .write_all(subscribe.as_bytes())
            .await
            .map_err(|source| LinkError::Subscribe {
                data_channel: target.data_channel.clone(),
                source,
            })?;
        debug!(relay = %self.addr, device_id = %target.device_id, "subscribed through relay");

        // The write half rides along so the relay never sees a half-close.
        let frames = stream::unfold(
            (BufReader::new(reader), writer),
            |(mut reader, writer)| async move {
                match read_frame(&mut reader).await {
                    Ok(Some(frame)) => Some((Ok(frame), (reader, writer))),
                    Ok(None) => None,
                    Err(err) => Some((Err(LinkError::Read(err)), (reader, writer))),
                }
            },
        );
        Ok(frames.boxed())
    }
}

async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<Option<Vec<u8>>> {
    let len = match reader.read_u8().await {
        Ok(len) => len,
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(err) => return Err(err),
    };
    let mut frame = vec![0u8; usize::from(len)];
    reader.read_exact(&mut frame).await?;
    Ok(Some(frame))
}
