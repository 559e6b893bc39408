use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("frame size mismatch: expected {expected} bytes, got {actual}")]
    FrameSize { expected: usize, actual: usize },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("volume {value} outside [{min}, {max}]")]
    VolumeOutOfRange { value: u16, min: u16, max: u16 },
    #[error("rate {value} outside [{min}, {max}]")]
    RateOutOfRange { value: f64, min: f64, max: f64 },
}
