use shared::domain::{CommandLimits, VOLUME_FLOOR};

use crate::estimator::MotionEnergy;

/// Exponentially averaged motion energy carried from one sample to the next.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct SmoothedMotion(f64);

impl SmoothedMotion {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// Response curve parameters. Validated by the caller before construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlCurve {
    pub sensitivity: f64,
    pub smoothing_factor: f64,
    pub normalisation_factor: f64,
    pub max_volume: u16,
    pub min_tempo: f64,
}

impl ControlCurve {
    pub fn limits(&self) -> CommandLimits {
        CommandLimits {
            max_volume: self.max_volume,
            min_tempo: self.min_tempo,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlOutput {
    pub smoothed: SmoothedMotion,
    /// Normalised control signal in `[0, 1]`.
    pub scaled: f64,
    pub volume: u16,
    pub rate: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ControlMapper {
    curve: ControlCurve,
}

impl ControlMapper {
    pub fn new(curve: ControlCurve) -> Self {
        Self { curve }
    }

    pub fn curve(&self) -> &ControlCurve {
        &self.curve
    }

    /// Single-pole low-pass: `(1 - a) * previous + a * energy`.
    pub fn smooth(&self, previous: SmoothedMotion, energy: MotionEnergy) -> SmoothedMotion {
        let alpha = self.curve.smoothing_factor;
        SmoothedMotion((1.0 - alpha) * previous.0 + alpha * energy.value())
    }

    pub fn scale(&self, smoothed: SmoothedMotion) -> f64 {
        (smoothed.0 * self.curve.sensitivity / self.curve.normalisation_factor)
            .max(0.0)
            .min(1.0)
    }

    /// Linear from the floor at `scaled = 0` to `max_volume` at `scaled = 1`,
    /// truncated toward the floor.
    pub fn volume_for(&self, scaled: f64) -> u16 {
        let span = f64::from(self.curve.max_volume.saturating_sub(VOLUME_FLOOR));
        let level = (f64::from(VOLUME_FLOOR) + scaled * span).floor();
        level as u16
    }

    pub fn rate_for(&self, scaled: f64) -> f64 {
        let min_tempo = self.curve.min_tempo;
        // f64::clamp panics when min_tempo > 1.
        (1.0 - (1.0 - min_tempo) * (1.0 - scaled))
            .max(min_tempo)
            .min(1.0)
    }

    pub fn map(&self, previous: SmoothedMotion, energy: MotionEnergy) -> ControlOutput {
        let smoothed = self.smooth(previous, energy);
        let scaled = self.scale(smoothed);
        ControlOutput {
            smoothed,
            scaled,
            volume: self.volume_for(scaled),
            rate: self.rate_for(scaled),
        }
    }
}

#[cfg(test)]
#[path = "tests/mapper_tests.rs"]
mod tests;
