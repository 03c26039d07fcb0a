//! Per-cycle outcome and run totals.

use crate::error::TrackerError;
use crate::localizer::PixelPoint;
use crate::transform::StagePoint;

/// What one iteration of the control loop did.
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// Frame acquisition failed or timed out.
    NoFrame,
    /// Sensing disabled; nothing acquired.
    Blind,
    /// Frame processed, no target this cycle.
    NoTarget,
    /// Target found but the transform rejected it.
    TransformFailed(PixelPoint),
    /// Paralyzed mode: target tracked without actuation.
    Tracked { pixel: PixelPoint, stage: StagePoint },
    /// Move transmitted.
    Moved { pixel: PixelPoint, x: i64, y: i64 },
    /// Move suppressed by the deadband.
    Deadbanded,
    /// Homing in progress; the controller was polled.
    HomingPolled { homed: bool },
    /// `home()` was issued this cycle.
    HomeRequested,
    /// Stage I/O failed; the loop continues.
    StageError(TrackerError),
}

impl CycleOutcome {
    /// Whether the localizer produced a target this cycle.
    pub fn had_target(&self) -> bool {
        !matches!(self, Self::NoFrame | Self::Blind | Self::NoTarget)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub cycles: u64,
    pub frames: u64,
    pub targets: u64,
    pub moves: u64,
    pub deadbanded: u64,
    pub homing_polls: u64,
    pub stage_errors: u64,
    pub frame_errors: u64,
}

impl RunStats {
    pub fn record(&mut self, o: &CycleOutcome) {
        self.cycles += 1;
        if o.had_target() {
            self.targets += 1;
        }
        if !matches!(o, CycleOutcome::NoFrame | CycleOutcome::Blind) {
            self.frames += 1;
        }
        match o {
            CycleOutcome::NoFrame => self.frame_errors += 1,
            CycleOutcome::Moved { .. } => self.moves += 1,
            CycleOutcome::Deadbanded => self.deadbanded += 1,
            CycleOutcome::HomingPolled { .. } => self.homing_polls += 1,
            CycleOutcome::StageError(_) => self.stage_errors += 1,
            _ => {}
        }
    }
}
