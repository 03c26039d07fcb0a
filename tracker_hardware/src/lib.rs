//! Device backends for the tracker: simulated camera and stage, a replay
//! camera over recorded images, and (feature `hardware`) a serial-port link.
pub mod error;
pub mod replay;
#[cfg(feature = "hardware")]
pub mod serial;
pub mod util;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::{GrayImage, Luma};
use tracker_traits::{BoxError, Camera, Clock, Frame, MonotonicClock, SerialLink};

use crate::error::HwError;

pub use replay::ReplayCamera;
#[cfg(feature = "hardware")]
pub use serial::SerialPortLink;

/// Identity line the simulated stage answers to `[getDeviceId]`.
pub const SIM_DEVICE_ID: &str = "{\"id\":\"stage_controller\",\"model\":\"sim\"}";

/// Simulated camera: a dark disc circling over a bright, static field.
///
/// The first `blank_frames` frames contain only the field so a background
/// model seeded from them starts clean.
pub struct SimulatedCamera {
    width: u32,
    height: u32,
    background: u8,
    blob: u8,
    radius: i64,
    blank_frames: u64,
    period: Option<Duration>,
    clock: MonotonicClock,
    frame_n: u64,
    started: bool,
    fail_every: Option<u64>,
}

impl SimulatedCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background: 200,
            blob: 40,
            radius: 6,
            blank_frames: 1,
            period: None,
            clock: MonotonicClock::new(),
            frame_n: 0,
            started: false,
            fail_every: None,
        }
    }

    /// Pace frames at `hz` (0 = no pacing).
    pub fn with_rate(mut self, hz: u32) -> Self {
        self.period = util::period_from_hz(hz);
        self
    }

    /// Report a timeout on every `n`-th acquisition.
    pub fn with_failures_every(mut self, n: u64) -> Self {
        self.fail_every = Some(n.max(1));
        self
    }

    /// Disc center for frame `n`; `None` for blank frames.
    pub fn blob_center(&self, n: u64) -> Option<(f64, f64)> {
        if n < self.blank_frames {
            return None;
        }
        let t = (n - self.blank_frames) as f64 / 60.0;
        let cx = f64::from(self.width) / 2.0;
        let cy = f64::from(self.height) / 2.0;
        let r = f64::from(self.width.min(self.height)) / 4.0;
        Some((cx + r * t.cos(), cy + r * t.sin()))
    }

    fn render(&self, n: u64) -> Frame {
        let mut img = GrayImage::from_pixel(self.width, self.height, Luma([self.background]));
        if let Some((cx, cy)) = self.blob_center(n) {
            let (cx, cy) = (cx.round() as i64, cy.round() as i64);
            let r2 = self.radius * self.radius;
            for y in (cy - self.radius).max(0)..=(cy + self.radius).min(i64::from(self.height) - 1) {
                for x in (cx - self.radius).max(0)..=(cx + self.radius).min(i64::from(self.width) - 1)
                {
                    let (dx, dy) = (x - cx, y - cy);
                    if dx * dx + dy * dy <= r2 {
                        img.put_pixel(x as u32, y as u32, Luma([self.blob]));
                    }
                }
            }
        }
        img
    }
}

impl Camera for SimulatedCamera {
    fn start(&mut self) -> Result<(), BoxError> {
        self.started = true;
        tracing::info!(width = self.width, height = self.height, "simulated camera started");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BoxError> {
        self.started = false;
        Ok(())
    }

    fn acquire(&mut self, _timeout: Duration) -> Result<Frame, BoxError> {
        if !self.started {
            return Err(Box::new(HwError::NotStarted));
        }
        if let Some(period) = self.period {
            self.clock.sleep(period);
        }
        let n = self.frame_n;
        self.frame_n += 1;
        if self.fail_every.is_some_and(|k| (n + 1) % k == 0) {
            return Err(Box::new(HwError::Timeout));
        }
        Ok(self.render(n))
    }
}

/// Shared record of every line written to a [`SimulatedStage`].
#[derive(Debug, Clone, Default)]
pub struct Transcript(Arc<Mutex<Vec<String>>>);

impl Transcript {
    pub fn lines(&self) -> Vec<String> {
        self.0.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Number of written lines starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.lines().iter().filter(|l| l.starts_with(prefix)).count()
    }

    fn push(&self, line: &str) {
        if let Ok(mut g) = self.0.lock() {
            g.push(line.to_string());
        }
    }
}

/// In-memory stage controller speaking the bracketed line protocol.
///
/// Homing completes after `homing_polls` negative answers to `[isHomed]`.
pub struct SimulatedStage {
    present: bool,
    open: bool,
    device_id: String,
    homing_polls: u32,
    polls: u32,
    homing: bool,
    homed: bool,
    empty_reads: u32,
    empty_left: u32,
    position: Option<(i64, i64)>,
    responses: VecDeque<String>,
    transcript: Transcript,
}

impl Default for SimulatedStage {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedStage {
    pub fn new() -> Self {
        Self {
            present: true,
            open: false,
            device_id: SIM_DEVICE_ID.to_string(),
            homing_polls: 2,
            polls: 0,
            homing: false,
            homed: false,
            empty_reads: 0,
            empty_left: 0,
            position: None,
            responses: VecDeque::new(),
            transcript: Transcript::default(),
        }
    }

    pub fn with_device_id(mut self, id: impl Into<String>) -> Self {
        self.device_id = id.into();
        self
    }

    pub fn with_homing_polls(mut self, n: u32) -> Self {
        self.homing_polls = n;
        self
    }

    /// Return `n` empty reads before every response, as a slow link would.
    pub fn with_empty_reads(mut self, n: u32) -> Self {
        self.empty_reads = n;
        self
    }

    /// Pretend the device node is absent.
    pub fn absent(mut self) -> Self {
        self.present = false;
        self
    }

    pub fn transcript(&self) -> Transcript {
        self.transcript.clone()
    }

    pub fn position(&self) -> Option<(i64, i64)> {
        self.position
    }

    fn respond(&mut self, line: String) {
        self.responses.push_back(line);
        self.empty_left = self.empty_reads;
    }

    fn handle(&mut self, line: &str) {
        let cmd = line.trim();
        if cmd == "[getDeviceId]" {
            let id = self.device_id.clone();
            self.respond(id);
        } else if cmd == "[homeStage]" {
            self.homing = true;
            self.homed = false;
            self.polls = 0;
        } else if cmd == "[isHomed]" {
            if self.homing && self.polls >= self.homing_polls {
                self.homed = true;
            }
            self.polls = self.polls.saturating_add(1);
            let answer = if self.homed { "true" } else { "false" };
            self.respond(answer.to_string());
        } else if let Some(pos) = parse_move(cmd) {
            if self.homed {
                self.position = Some(pos);
            } else {
                tracing::warn!(?pos, "simulated stage ignored move before homing");
            }
        } else {
            tracing::warn!(line = cmd, "simulated stage received unknown command");
        }
    }
}

/// Parse `[moveStageTo [x,y]]`.
fn parse_move(cmd: &str) -> Option<(i64, i64)> {
    let inner = cmd.strip_prefix("[moveStageTo [")?.strip_suffix("]]")?;
    let (x, y) = inner.split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}

impl SerialLink for SimulatedStage {
    fn device_present(&self) -> bool {
        self.present
    }

    fn open(&mut self) -> Result<(), BoxError> {
        if !self.present {
            return Err(Box::new(HwError::DeviceMissing("simulated".into())));
        }
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), BoxError> {
        self.open = false;
        self.responses.clear();
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> Result<(), BoxError> {
        if !self.open {
            return Err(Box::new(HwError::NotOpen));
        }
        self.transcript.push(line);
        self.handle(line);
        Ok(())
    }

    fn read_line(&mut self, _timeout: Duration) -> Result<Option<String>, BoxError> {
        if !self.open {
            return Err(Box::new(HwError::NotOpen));
        }
        if self.empty_left > 0 {
            self.empty_left -= 1;
            return Ok(None);
        }
        Ok(self.responses.pop_front().map(|l| util::strip_cr(&l)))
    }
}
