use std::{process::Stdio, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::{
    process::{Child, Command},
    time::timeout,
};
use tracing::{debug, info, warn};

use crate::channel::ControlChannelClient;

pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(5);

/// The external media player, as far as shutdown is concerned.
#[async_trait]
pub trait PlayerProcess: Send {
    fn is_running(&mut self) -> bool;
    /// Asks the player to exit on its own. Must not block on the exit itself.
    async fn request_stop(&mut self) -> Result<()>;
    async fn wait_exit(&mut self) -> Result<()>;
    async fn kill(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    NotRunning,
    Graceful,
    Killed,
}

/// Two-phase stop: graceful request, bounded wait, then a forced kill.
pub async fn stop_player(player: &mut dyn PlayerProcess, grace: Duration) -> Result<StopOutcome> {
    if !player.is_running() {
        return Ok(StopOutcome::NotRunning);
    }

    info!("stopping player process");
    if let Err(error) = player.request_stop().await {
        warn!(%error, "graceful stop request failed");
    }

    let waited = timeout(grace, player.wait_exit()).await;
    match waited {
        Ok(Ok(())) => Ok(StopOutcome::Graceful),
        Ok(Err(error)) => {
            warn!(%error, "waiting for player exit failed; killing");
            player.kill().await?;
            Ok(StopOutcome::Killed)
        }
        Err(_) => {
            warn!(
                grace_ms = grace.as_millis() as u64,
                "player did not terminate in time; killing"
            );
            player.kill().await?;
            Ok(StopOutcome::Killed)
        }
    }
}

/// VLC started with its rc interface bound to the control endpoint.
pub struct VlcProcess {
    child: Child,
    control: ControlChannelClient,
}

impl VlcProcess {
    pub fn spawn(binary: &str, playlist: &str, control: ControlChannelClient) -> Result<Self> {
        let child = Command::new(binary)
            .args(launch_args(&control, playlist))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to start player '{binary}'"))?;
        info!(pid = ?child.id(), playlist, "started player");
        Ok(Self::from_child(child, control))
    }

    pub fn from_child(child: Child, control: ControlChannelClient) -> Self {
        Self { child, control }
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }
}

fn launch_args(control: &ControlChannelClient, playlist: &str) -> Vec<String> {
    vec![
        "--intf".into(),
        "qt".into(),
        "--extraintf".into(),
        "rc".into(),
        "--rc-host".into(),
        control.endpoint().to_string(),
        "--no-video-title-show".into(),
        "--playlist-autostart".into(),
        "--play-and-exit".into(),
        playlist.into(),
    ]
}

#[async_trait]
impl PlayerProcess for VlcProcess {
    fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    async fn request_stop(&mut self) -> Result<()> {
        self.control
            .send("quit")
            .await
            .context("failed to send quit to player")
    }

    async fn wait_exit(&mut self) -> Result<()> {
        let status = self.child.wait().await.context("failed to wait for player")?;
        debug!(%status, "player exited");
        Ok(())
    }

    async fn kill(&mut self) -> Result<()> {
        self.child.kill().await.context("failed to kill player")
    }
}
