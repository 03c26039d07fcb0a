use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("serial error: {0}")]
    Serial(String),
    #[error("serial device {0} not found")]
    DeviceMissing(String),
    #[error("serial link not open")]
    NotOpen,
    #[error("read timeout")]
    Timeout,
    #[error("image error: {0}")]
    Image(String),
    #[error("frame size changed: expected {expected:?}, got {got:?}")]
    FrameSize {
        expected: (u32, u32),
        got: (u32, u32),
    },
    #[error("recording exhausted after {0} frames")]
    Exhausted(usize),
    #[error("camera not started")]
    NotStarted,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
