use shared::domain::OrientationSample;

/// Upper bound on a single sample's motion energy, in degrees.
pub const MAX_MOTION_ENERGY: f64 = 50.0;

/// Denoised angular-change magnitude for one sample, in `[0, MAX_MOTION_ENERGY]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct MotionEnergy(f64);

impl MotionEnergy {
    pub const ZERO: Self = Self(0.0);

    pub fn value(self) -> f64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MotionEstimator {
    noise_floor: f64,
}

impl MotionEstimator {
    pub fn new(noise_floor: f64) -> Self {
        Self { noise_floor }
    }

    pub fn noise_floor(&self) -> f64 {
        self.noise_floor
    }

    /// Euclidean norm of the per-axis deltas. Both samples carry wrapped yaw.
    pub fn raw_magnitude(previous: &OrientationSample, next: &OrientationSample) -> f64 {
        let dp = next.pitch - previous.pitch;
        let dy = next.yaw - previous.yaw;
        let dr = next.roll - previous.roll;
        (dp * dp + dy * dy + dr * dr).sqrt()
    }

    pub fn estimate(&self, previous: &OrientationSample, next: &OrientationSample) -> MotionEnergy {
        // `max` discards NaN, so a non-finite delta reads as stillness.
        let clamped = Self::raw_magnitude(previous, next)
            .max(0.0)
            .min(MAX_MOTION_ENERGY);
        if clamped < self.noise_floor {
            return MotionEnergy::ZERO;
        }
        MotionEnergy(clamped)
    }
}
