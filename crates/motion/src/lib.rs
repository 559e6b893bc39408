//! Orientation-delta to player-control signal chain.
//!
//! Everything here is synchronous and allocation free; the caller owns the
//! cross-sample state ([`PipelineState`]) and threads it through
//! [`MotionPipeline::step`] once per decoded sample.

mod estimator;
mod mapper;
mod pipeline;

pub use estimator::{MotionEnergy, MotionEstimator, MAX_MOTION_ENERGY};
pub use mapper::{ControlCurve, ControlMapper, ControlOutput, SmoothedMotion};
pub use pipeline::{MotionPipeline, PipelineState, StepOutput};
