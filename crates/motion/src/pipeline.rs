use shared::domain::OrientationSample;

use crate::{
    estimator::{MotionEnergy, MotionEstimator},
    mapper::{ControlCurve, ControlMapper, ControlOutput, SmoothedMotion},
};

/// The only cross-sample memory in the signal chain.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PipelineState {
    pub orientation: OrientationSample,
    pub smoothed: SmoothedMotion,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutput {
    pub energy: MotionEnergy,
    pub control: ControlOutput,
}

#[derive(Debug, Clone, Copy)]
pub struct MotionPipeline {
    estimator: MotionEstimator,
    mapper: ControlMapper,
}

impl MotionPipeline {
    pub fn new(noise_floor: f64, curve: ControlCurve) -> Self {
        Self {
            estimator: MotionEstimator::new(noise_floor),
            mapper: ControlMapper::new(curve),
        }
    }

    pub fn curve(&self) -> &ControlCurve {
        self.mapper.curve()
    }

    /// Advances `state` by one sample. Both fields are replaced together after
    /// the outputs are computed, so a caller never observes a half-applied step.
    pub fn step(&self, state: &mut PipelineState, sample: OrientationSample) -> StepOutput {
        let energy = self.estimator.estimate(&state.orientation, &sample);
        let control = self.mapper.map(state.smoothed, energy);
        *state = PipelineState {
            orientation: sample,
            smoothed: control.smoothed,
        };
        StepOutput { energy, control }
    }
}
