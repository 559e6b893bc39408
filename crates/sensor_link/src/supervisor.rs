use std::{sync::Arc, time::Duration};

use futures::StreamExt;
use shared::{domain::ConnectionState, protocol::decode_frame};
use tokio::{
    sync::{mpsc, watch},
    time::{sleep, timeout},
};
use tracing::{debug, info, warn};

use crate::{
    shutdown::{shutdown_requested, wait_for_shutdown},
    FrameStream, LinkEvent, SensorConnector, SensorTarget,
};

pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Upper bound on delivering each closing state event to a stalled consumer.
const TERMINAL_EVENT_WAIT: Duration = Duration::from_millis(250);

/// Why supervision stopped.
enum Halt {
    Shutdown,
    /// The orchestrator hung up; nobody is left to feed.
    EventsClosed,
}

struct ClosedSession {
    reason: String,
    samples: u64,
}

pub struct SensorLinkSupervisor {
    connector: Arc<dyn SensorConnector>,
    target: SensorTarget,
    reconnect_delay: Duration,
    events: mpsc::Sender<LinkEvent>,
    state: ConnectionState,
}

impl SensorLinkSupervisor {
    pub fn new(
        connector: Arc<dyn SensorConnector>,
        target: SensorTarget,
        events: mpsc::Sender<LinkEvent>,
    ) -> Self {
        Self {
            connector,
            target,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            events,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn with_reconnect_delay(mut self, reconnect_delay: Duration) -> Self {
        self.reconnect_delay = reconnect_delay;
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Connects, streams samples, and reconnects forever until `shutdown`
    /// fires or the event receiver is dropped. Always finishes by passing
    /// through `Disconnecting` into `Disconnected`.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(device_id = %self.target.device_id, "waiting for sensor device");
        let halt = loop {
            if let Err(halt) = self.connect_once(&mut shutdown).await {
                break halt;
            }
        };
        if let Halt::EventsClosed = halt {
            info!("sensor event receiver closed; stopping link supervisor");
        }
        self.finish(ConnectionState::Disconnecting).await;
        self.finish(ConnectionState::Disconnected).await;
        info!(device_id = %self.target.device_id, "sensor link supervisor stopped");
    }

    /// One establishment attempt and, if it succeeds, one streaming session.
    async fn connect_once(&mut self, shutdown: &mut watch::Receiver<bool>) -> Result<(), Halt> {
        if shutdown_requested(shutdown) {
            return Err(Halt::Shutdown);
        }
        self.transition(ConnectionState::Connecting, shutdown).await?;

        let opened = tokio::select! {
            biased;
            _ = wait_for_shutdown(shutdown) => return Err(Halt::Shutdown),
            opened = self.connector.open(&self.target) => opened,
        };

        let frames = match opened {
            Ok(frames) => frames,
            Err(error) => {
                warn!(
                    device_id = %self.target.device_id,
                    %error,
                    retry_in_ms = self.reconnect_delay.as_millis() as u64,
                    "sensor not available yet"
                );
                self.transition(ConnectionState::Disconnected, shutdown).await?;
                return self.back_off(shutdown).await;
            }
        };

        info!(
            device_id = %self.target.device_id,
            data_channel = %self.target.data_channel,
            "connected to sensor"
        );
        self.transition(ConnectionState::Connected, shutdown).await?;

        let session = self.stream_samples(frames, shutdown).await?;
        self.transition(ConnectionState::Disconnected, shutdown).await?;

        // A link that closes before its first sample never reached the player,
        // so it is treated like a failed attempt.
        if session.samples == 0 {
            warn!(
                device_id = %self.target.device_id,
                reason = %session.reason,
                retry_in_ms = self.reconnect_delay.as_millis() as u64,
                "sensor link closed before any sample arrived"
            );
            return self.back_off(shutdown).await;
        }

        warn!(
            device_id = %self.target.device_id,
            reason = %session.reason,
            samples = session.samples,
            "sensor link lost; pausing playback"
        );
        self.emit(LinkEvent::Lost { reason: session.reason }, shutdown).await
    }

    async fn stream_samples(
        &self,
        mut frames: FrameStream,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<ClosedSession, Halt> {
        let mut samples = 0;
        loop {
            let next = tokio::select! {
                biased;
                _ = wait_for_shutdown(shutdown) => return Err(Halt::Shutdown),
                next = frames.next() => next,
            };

            let frame = match next {
                Some(Ok(frame)) => frame,
                Some(Err(error)) => {
                    let reason = error.to_string();
                    return Ok(ClosedSession { reason, samples });
                }
                None => {
                    let reason = "device disconnected".to_owned();
                    return Ok(ClosedSession { reason, samples });
                }
            };

            match decode_frame(&frame) {
                Ok(sample) => {
                    self.emit(LinkEvent::Sample(sample), shutdown).await?;
                    samples += 1;
                }
                Err(error) => {
                    warn!(len = frame.len(), %error, "dropping undecodable frame");
                }
            }
        }
    }

    async fn back_off(&self, shutdown: &mut watch::Receiver<bool>) -> Result<(), Halt> {
        tokio::select! {
            biased;
            _ = wait_for_shutdown(shutdown) => Err(Halt::Shutdown),
            _ = sleep(self.reconnect_delay) => Ok(()),
        }
    }

    async fn transition(
        &mut self,
        next: ConnectionState,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), Halt> {
        self.state = next;
        info!(state = %next, "sensor link state changed");
        self.emit(LinkEvent::State(next), shutdown).await
    }

    /// Closing transitions still reach a slow consumer, but never hold up
    /// the stop when nobody is draining the channel.
    async fn finish(&mut self, next: ConnectionState) {
        self.state = next;
        info!(state = %next, "sensor link state changed");
        if timeout(TERMINAL_EVENT_WAIT, self.events.send(LinkEvent::State(next)))
            .await
            .is_err()
        {
            debug!(state = %next, "event consumer stalled; closing state not delivered");
        }
    }

    async fn emit(
        &self,
        event: LinkEvent,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), Halt> {
        tokio::select! {
            biased;
            _ = wait_for_shutdown(shutdown) => Err(Halt::Shutdown),
            sent = self.events.send(event) => sent.map_err(|_| Halt::EventsClosed),
        }
    }
}

#[cfg(test)]
#[path = "tests/supervisor_tests.rs"]
mod tests;
