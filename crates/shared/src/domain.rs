use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CommandError;

/// Lowest volume the mapper ever emits; keeps the player audible while still.
pub const VOLUME_FLOOR: u16 = 50;

/// One decoded orientation reading, in degrees.
///
/// `yaw` is always wrapped into `(-180, 180]`; use [`OrientationSample::new`]
/// rather than building the struct by hand when the yaw source is untrusted.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrientationSample {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

impl OrientationSample {
    pub fn new(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self {
            pitch,
            yaw: wrap_yaw(yaw),
            roll,
        }
    }
}

/// Wraps an angle in degrees into `(-180, 180]`.
pub fn wrap_yaw(degrees: f64) -> f64 {
    let mut wrapped = degrees.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped -= 360.0;
    }
    wrapped
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnecting => "disconnecting",
        };
        f.write_str(label)
    }
}

/// Closed intervals every dispatched command must respect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandLimits {
    pub max_volume: u16,
    pub min_tempo: f64,
}

/// A player command. Volume and rate values are absolute, never deltas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlCommand {
    Volume(u16),
    Rate(f64),
    Pause,
}

impl ControlCommand {
    pub fn volume(level: u16, limits: &CommandLimits) -> Result<Self, CommandError> {
        if level < VOLUME_FLOOR || level > limits.max_volume {
            return Err(CommandError::VolumeOutOfRange {
                value: level,
                min: VOLUME_FLOOR,
                max: limits.max_volume,
            });
        }
        Ok(Self::Volume(level))
    }

    pub fn rate(multiplier: f64, limits: &CommandLimits) -> Result<Self, CommandError> {
        // NaN fails both comparisons, so test for containment rather than exclusion.
        if !(multiplier >= limits.min_tempo && multiplier <= 1.0) {
            return Err(CommandError::RateOutOfRange {
                value: multiplier,
                min: limits.min_tempo,
                max: 1.0,
            });
        }
        Ok(Self::Rate(multiplier))
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Volume(level) => write!(f, "volume {level}"),
            Self::Rate(multiplier) => write!(f, "rate {multiplier}"),
            Self::Pause => f.write_str("pause"),
        }
    }
}
