//! The control loop: frame, target, stage point, actuation.

use std::sync::Arc;
use std::time::Duration;

use eyre::WrapErr;
use tracker_traits::{Camera, Clock, SerialLink};

use crate::cancel::CancelToken;
use crate::config::LoopCfg;
use crate::error::{Result, TrackerError};
use crate::fps::FrameRateCounter;
use crate::hw_error::map_hw_error;
use crate::localizer::{Locate, Localizer};
use crate::stage::{HomingState, MoveOutcome, StageController};
use crate::status::{CycleOutcome, RunStats};
use crate::transform::CoordinateTransform;

pub struct Tracker<C: Camera, L: SerialLink> {
    pub(crate) camera: C,
    pub(crate) localizer: Localizer,
    pub(crate) transform: CoordinateTransform,
    pub(crate) stage: StageController<L>,
    pub(crate) cfg: LoopCfg,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) fps: FrameRateCounter,
    pub(crate) frames: u64,
    pub(crate) false_polls: u32,
}

impl<C: Camera, L: SerialLink> std::fmt::Debug for Tracker<C, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("cfg", &self.cfg)
            .field("stage", &self.stage)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

/// Extract the typed error from a report, falling back to its text.
fn typed(e: &eyre::Report) -> TrackerError {
    e.downcast_ref::<TrackerError>()
        .cloned()
        .unwrap_or_else(|| TrackerError::Hardware(format!("{e:#}")))
}

impl<C: Camera, L: SerialLink> Tracker<C, L> {
    pub fn config(&self) -> &LoopCfg {
        &self.cfg
    }

    pub fn stage(&self) -> &StageController<L> {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut StageController<L> {
        &mut self.stage
    }

    pub fn transform(&self) -> &CoordinateTransform {
        &self.transform
    }

    pub fn localizer(&self) -> &Localizer {
        &self.localizer
    }

    /// Connect the stage unless running paralyzed.
    pub fn connect(&mut self) -> Result<()> {
        if self.cfg.paralyzed {
            tracing::info!("paralyzed: stage left disconnected");
            return Ok(());
        }
        self.stage.connect()
    }

    /// Best-effort shutdown of the stage link.
    pub fn disconnect(&mut self) {
        self.stage.disconnect();
    }

    /// One iteration of the control loop. Never fails; problems are reported
    /// in the outcome and the next cycle proceeds.
    pub fn step(&mut self) -> CycleOutcome {
        if self.cfg.blind {
            self.clock.sleep(Duration::from_millis(self.cfg.idle_ms));
            return CycleOutcome::Blind;
        }

        let timeout = Duration::from_millis(self.cfg.frame_timeout_ms);
        let frame = match self.camera.acquire(timeout) {
            Ok(f) => f,
            Err(e) => {
                let err = map_hw_error(&*e);
                tracing::debug!(error = %err, "no frame");
                return CycleOutcome::NoFrame;
            }
        };
        self.count_frame();

        let Some(pixel) = self.localizer.locate(&frame) else {
            return CycleOutcome::NoTarget;
        };
        let stage_pt = match self.transform.to_stage(pixel) {
            Ok(s) => s,
            Err(e) => {
                tracing::debug!(error = %e, x = pixel.x, y = pixel.y, "transform rejected target");
                return CycleOutcome::TransformFailed(pixel);
            }
        };
        tracing::trace!(px = pixel.x, py = pixel.y, sx = stage_pt.x, sy = stage_pt.y, "target");

        if self.cfg.paralyzed {
            return CycleOutcome::Tracked {
                pixel,
                stage: stage_pt,
            };
        }

        let res = match self.stage.state() {
            HomingState::Homed => self.stage.move_to(stage_pt).map(|m| match m {
                MoveOutcome::Sent { x, y } => CycleOutcome::Moved { pixel, x, y },
                MoveOutcome::Deadbanded => CycleOutcome::Deadbanded,
                MoveOutcome::NotHomed => CycleOutcome::HomingPolled { homed: false },
            }),
            HomingState::Homing => self.poll_homing(),
            HomingState::NotHomed => self
                .stage
                .home()
                .map(|()| CycleOutcome::HomeRequested),
        };
        res.unwrap_or_else(|e| {
            tracing::warn!(error = %format!("{e:#}"), "stage error");
            CycleOutcome::StageError(typed(&e))
        })
    }

    fn poll_homing(&mut self) -> Result<CycleOutcome> {
        if self.stage.is_homed()? {
            self.false_polls = 0;
            return Ok(CycleOutcome::HomingPolled { homed: true });
        }
        self.false_polls = self.false_polls.saturating_add(1);
        if self.cfg.rehome_after_polls.is_some_and(|limit| self.false_polls >= limit) {
            tracing::warn!(polls = self.false_polls, "homing stalled; re-homing");
            self.false_polls = 0;
            self.stage.home()?;
            return Ok(CycleOutcome::HomeRequested);
        }
        Ok(CycleOutcome::HomingPolled { homed: false })
    }

    fn count_frame(&mut self) {
        self.frames += 1;
        self.fps.tick(self.clock.now());
        let every = self.cfg.report_every;
        if every > 0 && self.frames % every == 0 {
            match self.fps.fps() {
                Some(fps) => tracing::info!(frames = self.frames, fps = %format!("{fps:.1}"), "frame rate"),
                None => tracing::info!(frames = self.frames, "frame rate unavailable"),
            }
        }
    }

    /// Run until `cancel` is set or `max_cycles` is reached.
    pub fn run(&mut self, cancel: &CancelToken) -> Result<RunStats> {
        if !self.cfg.blind {
            self.camera
                .start()
                .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
                .wrap_err("starting camera")?;
        }
        tracing::info!(
            blind = self.cfg.blind,
            paralyzed = self.cfg.paralyzed,
            max_cycles = ?self.cfg.max_cycles,
            "tracking started"
        );

        let mut stats = RunStats::default();
        while !cancel.is_cancelled() {
            if self.cfg.max_cycles.is_some_and(|m| stats.cycles >= m) {
                break;
            }
            let outcome = self.step();
            stats.record(&outcome);
        }

        if !self.cfg.blind {
            if let Err(e) = self.camera.stop() {
                tracing::warn!(error = %e, "camera stop failed");
            }
        }
        tracing::info!(
            cycles = stats.cycles,
            frames = stats.frames,
            targets = stats.targets,
            moves = stats.moves,
            deadbanded = stats.deadbanded,
            stage_errors = stats.stage_errors,
            cancelled = cancel.is_cancelled(),
            "tracking finished"
        );
        Ok(stats)
    }
}
