use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::channel::ControlChannelClient;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(10);

/// Polls the control port until it accepts a connection or `ready_timeout`
/// elapses. Returns whether the port became reachable.
pub async fn wait_until_ready(
    client: &ControlChannelClient,
    poll_interval: Duration,
    ready_timeout: Duration,
) -> bool {
    info!(endpoint = %client.endpoint(), "waiting for player control interface");
    let deadline = Instant::now() + ready_timeout;
    loop {
        match client.check_reachable().await {
            Ok(()) => {
                info!(endpoint = %client.endpoint(), "player control interface is ready");
                return true;
            }
            Err(error) => debug!(%error, "player control interface not ready yet"),
        }

        let now = Instant::now();
        if now >= deadline {
            warn!(
                endpoint = %client.endpoint(),
                timeout_ms = ready_timeout.as_millis() as u64,
                "player control interface not available after timeout"
            );
            return false;
        }
        sleep(poll_interval.min(deadline - now)).await;
    }
}
