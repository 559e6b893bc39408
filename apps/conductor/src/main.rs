use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Parser;
use player_control::{stop_player, CommandSink, ControlChannelClient, PlayerProcess, VlcProcess};
use sensor_link::{RelayConnector, SensorConnector, SensorLinkSupervisor};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

mod orchestrator;
mod settings;
mod startup;

use orchestrator::ControlLoop;
use settings::load_settings;
use startup::{await_player, listen_for_shutdown, PlayerStartup};

const EVENT_QUEUE_DEPTH: usize = 256;

/// Drives media player volume and tempo from a wearable orientation sensor.
#[derive(Parser, Debug)]
struct Args {
    /// Configuration base path; `config` picks up config.yaml or config.toml.
    #[arg(long, default_value = "config")]
    config: String,
    /// Attach to an already running player instead of launching one.
    #[arg(long)]
    no_player: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let settings = load_settings(&args.config)?;
    info!(
        max_volume = settings.output_values.max_volume,
        sensitivity = settings.control_parameters.sensitivity,
        playlist = %settings.playlist,
        "motion control starting"
    );
    debug!(
        decay_rate = settings.control_parameters.decay_rate,
        "decay_rate is reserved and not applied"
    );

    let mut shutdown_rx = listen_for_shutdown()?;

    let control = ControlChannelClient::new(settings.control_endpoint())
        .with_timeouts(settings.connect_timeout(), settings.connect_timeout());
    let sink: Arc<dyn CommandSink> = Arc::new(control.clone());
    let mut control_loop = ControlLoop::new(settings.motion_pipeline(), sink);

    let mut player = if args.no_player {
        None
    } else {
        Some(VlcProcess::spawn(
            &settings.player.binary,
            &settings.playlist,
            control.clone(),
        )?)
    };

    let startup = await_player(
        &control,
        settings.ready_poll_interval(),
        settings.ready_timeout(),
        &mut shutdown_rx,
    )
    .await;
    match startup {
        PlayerStartup::Ready => {}
        PlayerStartup::NotReady if settings.player.require_ready => {
            if let Some(player) = player.as_mut() {
                stop_player(player, settings.stop_grace()).await?;
            }
            bail!(
                "player control interface at {} never became ready",
                control.endpoint()
            );
        }
        PlayerStartup::NotReady => {}
        PlayerStartup::Cancelled => {
            info!("shutdown requested while waiting for the player");
            control_loop
                .shutdown(
                    player.as_mut().map(|player| player as &mut dyn PlayerProcess),
                    settings.stop_grace(),
                )
                .await;
            return Ok(());
        }
    }

    let (events_tx, mut events_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
    let connector: Arc<dyn SensorConnector> =
        Arc::new(RelayConnector::new(settings.sensor.relay_addr.clone()));
    let supervisor = SensorLinkSupervisor::new(connector, settings.sensor_target(), events_tx)
        .with_reconnect_delay(settings.reconnect_delay());
    let link = tokio::spawn(supervisor.run(shutdown_rx));

    control_loop.run(&mut events_rx).await;

    if let Err(error) = link.await {
        error!(%error, "sensor link task failed");
    }

    control_loop
        .shutdown(
            player.as_mut().map(|player| player as &mut dyn PlayerProcess),
            settings.stop_grace(),
        )
        .await;
    info!("motion control stopped");
    Ok(())
}
