use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use player_control::{stop_player, PlayerProcess, StopOutcome};

#[derive(Default)]
struct Calls(Mutex<Vec<&'static str>>);

impl Calls {
    fn push(&self, call: &'static str) {
        self.0.lock().expect("calls lock").push(call);
    }

    fn snapshot(&self) -> Vec<&'static str> {
        self.0.lock().expect("calls lock").clone()
    }
}

struct ScriptedPlayer {
    running: bool,
    exits_on_request: bool,
    refuse_request: bool,
    calls: Arc<Calls>,
}

impl ScriptedPlayer {
    fn new(exits_on_request: bool, calls: Arc<Calls>) -> Self {
        Self {
            running: true,
            exits_on_request,
            refuse_request: false,
            calls,
        }
    }
}

#[async_trait]
impl PlayerProcess for ScriptedPlayer {
    fn is_running(&mut self) -> bool {
        self.running
    }

    async fn request_stop(&mut self) -> Result<()> {
        self.calls.push("request_stop");
        if self.refuse_request {
            return Err(anyhow!("control port closed"));
        }
        Ok(())
    }

    async fn wait_exit(&mut self) -> Result<()> {
        self.calls.push("wait_exit");
        if !self.exits_on_request {
            std::future::pending::<()>().await;
        }
        self.running = false;
        Ok(())
    }

    async fn kill(&mut self) -> Result<()> {
        self.calls.push("kill");
        self.running = false;
        Ok(())
    }
}

#[tokio::test]
async fn cooperative_player_stops_gracefully() {
    let calls = Arc::new(Calls::default());
    let mut player = ScriptedPlayer::new(true, Arc::clone(&calls));

    let outcome = stop_player(&mut player, Duration::from_millis(200))
        .await
        .expect("stop");

    assert_eq!(outcome, StopOutcome::Graceful);
    assert_eq!(calls.snapshot(), vec!["request_stop", "wait_exit"]);
}

#[tokio::test]
async fn hung_player_is_killed_after_grace() {
    let calls = Arc::new(Calls::default());
    let mut player = ScriptedPlayer::new(false, Arc::clone(&calls));

    let outcome = stop_player(&mut player, Duration::from_millis(50))
        .await
        .expect("stop");

    assert_eq!(outcome, StopOutcome::Killed);
    assert_eq!(calls.snapshot(), vec!["request_stop", "wait_exit", "kill"]);
    assert!(!player.is_running());
}

#[tokio::test]
async fn failed_stop_request_still_waits_then_kills() {
    let calls = Arc::new(Calls::default());
    let mut player = ScriptedPlayer::new(false, Arc::clone(&calls));
    player.refuse_request = true;

    let outcome = stop_player(&mut player, Duration::from_millis(50))
        .await
        .expect("stop");

    assert_eq!(outcome, StopOutcome::Killed);
}

#[tokio::test]
async fn exited_player_needs_no_stop() {
    let calls = Arc::new(Calls::default());
    let mut player = ScriptedPlayer::new(true, Arc::clone(&calls));
    player.running = false;

    let outcome = stop_player(&mut player, Duration::from_millis(50))
        .await
        .expect("stop");

    assert_eq!(outcome, StopOutcome::NotRunning);
    assert!(calls.snapshot().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn real_child_ignoring_quit_is_killed() {
    use player_control::{ControlChannelClient, ControlEndpoint, VlcProcess};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);

    let child = tokio::process::Command::new("sleep")
        .arg("30")
        .kill_on_drop(true)
        .spawn()
        .expect("spawn sleep");
    let control = ControlChannelClient::new(ControlEndpoint::new("127.0.0.1", port))
        .with_timeouts(Duration::from_millis(100), Duration::from_millis(100));
    let mut player = VlcProcess::from_child(child, control);
    assert!(player.is_running());

    let outcome = stop_player(&mut player, Duration::from_millis(200))
        .await
        .expect("stop");

    assert_eq!(outcome, StopOutcome::Killed);
    assert!(!player.is_running());
}
