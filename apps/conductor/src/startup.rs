//! Interrupt wiring and the cancellable wait for the player at startup.

use std::{future::Future, time::Duration};

use anyhow::{Context, Result};
use player_control::{wait_until_ready, ControlChannelClient};
use sensor_link::wait_for_shutdown;
use tokio::sync::watch;
use tracing::info;

/// How the wait for the player's control port ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStartup {
    Ready,
    NotReady,
    Cancelled,
}

/// Installs the interrupt handler and returns the shutdown receiver that
/// flips to `true` on Ctrl-C. The handler is registered before this
/// returns, so an interrupt while the player launches is not lost.
pub fn listen_for_shutdown() -> Result<watch::Receiver<bool>> {
    let interrupted = interrupt_signal().context("failed to install the interrupt handler")?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        interrupted.await;
        info!("shutdown requested");
        let _ = shutdown_tx.send(true);
    });
    Ok(shutdown_rx)
}

#[cfg(unix)]
fn interrupt_signal() -> std::io::Result<impl Future<Output = ()> + Send> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    Ok(async move {
        interrupt.recv().await;
    })
}

#[cfg(windows)]
fn interrupt_signal() -> std::io::Result<impl Future<Output = ()> + Send> {
    let mut ctrl_c = tokio::signal::windows::ctrl_c()?;
    Ok(async move {
        ctrl_c.recv().await;
    })
}

/// Waits for the control port like [`wait_until_ready`], but gives up as
/// soon as shutdown is requested.
pub async fn await_player(
    control: &ControlChannelClient,
    poll_interval: Duration,
    ready_timeout: Duration,
    shutdown: &mut watch::Receiver<bool>,
) -> PlayerStartup {
    tokio::select! {
        biased;
        _ = wait_for_shutdown(shutdown) => PlayerStartup::Cancelled,
        ready = wait_until_ready(control, poll_interval, ready_timeout) => {
            if ready {
                PlayerStartup::Ready
            } else {
                PlayerStartup::NotReady
            }
        }
    }
}
