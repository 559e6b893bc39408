//! Sample-by-sample control loop and its teardown.

use std::{sync::Arc, time::Duration};

use motion::{MotionPipeline, PipelineState};
use player_control::{channel::dispatch, stop_player, CommandSink, PlayerProcess, StopOutcome};
use sensor_link::LinkEvent;
use shared::domain::{CommandLimits, ControlCommand, OrientationSample};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error, info, warn};

pub struct ControlLoop {
    pipeline: MotionPipeline,
    limits: CommandLimits,
    state: PipelineState,
    sink: Arc<dyn CommandSink>,
}

impl ControlLoop {
    pub fn new(pipeline: MotionPipeline, sink: Arc<dyn CommandSink>) -> Self {
        let limits = pipeline.curve().limits();
        Self {
            pipeline,
            limits,
            state: PipelineState::default(),
            sink,
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Consumes link events in arrival order until the supervisor hangs up.
    pub async fn run(&mut self, events: &mut mpsc::Receiver<LinkEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                LinkEvent::Sample(sample) => {
                    self.handle_sample(sample);
                }
                LinkEvent::Lost { reason } => {
                    self.handle_link_lost(&reason);
                }
                LinkEvent::State(state) => debug!(%state, "control loop observed link state"),
            }
        }
        info!("sensor event stream closed");
    }

    /// Runs one sample through the pipeline and fires off the resulting
    /// commands. Returns the commands that passed range checks.
    pub fn handle_sample(&mut self, sample: OrientationSample) -> Vec<ControlCommand> {
        let out = self.pipeline.step(&mut self.state, sample).control;

        let mut dispatched = Vec::with_capacity(2);
        for candidate in [
            ControlCommand::volume(out.volume, &self.limits),
            ControlCommand::rate(out.rate, &self.limits),
        ] {
            match candidate {
                Ok(command) => {
                    dispatch(&self.sink, command);
                    dispatched.push(command);
                }
                Err(error) => warn!(%error, "rejected out-of-range control value"),
            }
        }

        info!(
            pitch = sample.pitch,
            yaw = sample.yaw,
            roll = sample.roll,
            smoothed_motion = out.smoothed.value(),
            volume = out.volume,
            rate = out.rate,
            "sample processed"
        );
        dispatched
    }

    pub fn handle_link_lost(&self, reason: &str) -> JoinHandle<()> {
        info!(%reason, "sensor disconnected; pausing playback");
        dispatch(&self.sink, ControlCommand::Pause)
    }

    /// Final `pause` (best effort), then the two-phase player stop.
    pub async fn shutdown(
        self,
        player: Option<&mut dyn PlayerProcess>,
        grace: Duration,
    ) -> Option<StopOutcome> {
        if let Err(error) = self.sink.deliver(ControlCommand::Pause).await {
            warn!(%error, "final pause not delivered");
        }

        let player = player?;
        match stop_player(player, grace).await {
            Ok(outcome) => {
                info!(?outcome, "player stopped");
                Some(outcome)
            }
            Err(error) => {
                error!(%error, "failed to stop player");
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/orchestrator_tests.rs"]
mod tests;
