//! Keeps the orientation sensor connected and turns its notifications into
//! decoded samples on an event channel.

use std::io;

use async_trait::async_trait;
use futures::stream::BoxStream;
use shared::domain::{ConnectionState, OrientationSample};
use thiserror::Error;

mod relay;
mod shutdown;
mod supervisor;

pub use relay::RelayConnector;
pub use shutdown::{shutdown_requested, wait_for_shutdown};
pub use supervisor::{SensorLinkSupervisor, DEFAULT_RECONNECT_DELAY};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorTarget {
    pub device_id: String,
    pub data_channel: String,
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("sensor {device_id} unreachable: {reason}")]
    Unreachable { device_id: String, reason: String },
    #[error("subscription to {data_channel} failed: {source}")]
    Subscribe {
        data_channel: String,
        source: io::Error,
    },
    #[error("sensor read failed: {0}")]
    Read(#[from] io::Error),
}

/// Raw notification payloads in arrival order. End of stream means the device
/// reported a disconnect; an `Err` item is a read failure.
pub type FrameStream = BoxStream<'static, Result<Vec<u8>, LinkError>>;

#[async_trait]
pub trait SensorConnector: Send + Sync {
    /// Establishes the link and subscribes to the target's data channel.
    async fn open(&self, target: &SensorTarget) -> Result<FrameStream, LinkError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    State(ConnectionState),
    Sample(OrientationSample),
    /// An established link dropped. Emitted before any reconnect attempt.
    Lost { reason: String },
}
