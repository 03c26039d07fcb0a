use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum TrackerError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("calibration error: {0}")]
    Calibration(String),
    #[error("stage device {0} not present")]
    DevicePathMissing(String),
    #[error("stage handshake failed: {0}")]
    Handshake(String),
    #[error("no response from stage after {0} read attempts")]
    ReadRetriesExhausted(u32),
    #[error("timeout waiting for device")]
    Timeout,
    #[error("invalid state: {0}")]
    State(String),
    #[error("io error: {0}")]
    Io(String),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TransformError {
    #[error("point maps to infinity (w = 0)")]
    AtInfinity,
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing camera")]
    MissingCamera,
    #[error("missing stage")]
    MissingStage,
    #[error("missing coordinate transform")]
    MissingTransform,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
