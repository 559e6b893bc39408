//! Sensor frame decoding and player control-line encoding.

use crate::{domain::ControlCommand, domain::OrientationSample, error::DecodeError};

/// Three little-endian `i16` fields: pitch, yaw, roll in tenths of a degree.
pub const FRAME_LEN: usize = 6;

const TENTHS_PER_DEGREE: f64 = 10.0;

pub fn decode_frame(frame: &[u8]) -> Result<OrientationSample, DecodeError> {
    let Ok(bytes) = <[u8; FRAME_LEN]>::try_from(frame) else {
        return Err(DecodeError::FrameSize {
            expected: FRAME_LEN,
            actual: frame.len(),
        });
    };

    let field = |at: usize| f64::from(i16::from_le_bytes([bytes[at], bytes[at + 1]]));
    Ok(OrientationSample::new(
        field(0) / TENTHS_PER_DEGREE,
        field(2) / TENTHS_PER_DEGREE,
        field(4) / TENTHS_PER_DEGREE,
    ))
}

/// Builds a wire frame from raw tenth-of-degree readings.
pub fn encode_frame(pitch_tenths: i16, yaw_tenths: i16, roll_tenths: i16) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];
    frame[0..2].copy_from_slice(&pitch_tenths.to_le_bytes());
    frame[2..4].copy_from_slice(&yaw_tenths.to_le_bytes());
    frame[4..6].copy_from_slice(&roll_tenths.to_le_bytes());
    frame
}

/// Renders a command as one newline-terminated line for the player's rc port.
pub fn command_line(command: &ControlCommand) -> String {
    format!("{command}\n")
}
