//! Collaborator seams for the tracking stack.
//!
//! The control loop in `tracker_core` never touches a device directly; it
//! drives a [`Camera`] for frames and a [`SerialLink`] for the stage. Both
//! traits report failures as boxed errors so backends can surface whatever
//! error type they own.

pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

use std::time::Duration;

/// Single-channel 8-bit raster delivered by a camera.
///
/// A frame is owned by the control loop for exactly one cycle; anything that
/// needs pixels beyond that cycle copies them.
pub type Frame = image::GrayImage;

/// Error type crossing the trait boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub trait Camera {
    fn start(&mut self) -> Result<(), BoxError>;
    fn stop(&mut self) -> Result<(), BoxError>;
    /// Block until the next frame is available or `timeout` elapses.
    fn acquire(&mut self, timeout: Duration) -> Result<Frame, BoxError>;
}

/// Line-oriented byte channel to the stage controller.
pub trait SerialLink {
    /// Whether the underlying device node is present. Checked before `open`.
    fn device_present(&self) -> bool;
    fn open(&mut self) -> Result<(), BoxError>;
    fn close(&mut self) -> Result<(), BoxError>;
    /// Write `line` followed by a single `\n`.
    fn write_line(&mut self, line: &str) -> Result<(), BoxError>;
    /// Read up to the next `\n`, with `\r` stripped.
    ///
    /// `Ok(None)` means nothing complete arrived within `timeout`; callers
    /// may retry.
    fn read_line(&mut self, timeout: Duration) -> Result<Option<String>, BoxError>;
}

impl<C: Camera + ?Sized> Camera for Box<C> {
    fn start(&mut self) -> Result<(), BoxError> {
        (**self).start()
    }
    fn stop(&mut self) -> Result<(), BoxError> {
        (**self).stop()
    }
    fn acquire(&mut self, timeout: Duration) -> Result<Frame, BoxError> {
        (**self).acquire(timeout)
    }
}

impl<L: SerialLink + ?Sized> SerialLink for Box<L> {
    fn device_present(&self) -> bool {
        (**self).device_present()
    }
    fn open(&mut self) -> Result<(), BoxError> {
        (**self).open()
    }
    fn close(&mut self) -> Result<(), BoxError> {
        (**self).close()
    }
    fn write_line(&mut self, line: &str) -> Result<(), BoxError> {
        (**self).write_line(line)
    }
    fn read_line(&mut self, timeout: Duration) -> Result<Option<String>, BoxError> {
        (**self).read_line(timeout)
    }
}
