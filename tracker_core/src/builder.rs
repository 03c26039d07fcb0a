//! Type-state builder for `Tracker` and generic `build_tracker` constructor.
//!
//! The builder enforces at compile time that a camera, a stage link and a
//! coordinate transform are provided before `build()` is available.
//! `try_build()` is always available for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;

use tracker_traits::clock::{Clock, MonotonicClock};
use tracker_traits::{Camera, SerialLink};

use crate::click::ClickReceiver;
use crate::config::{LocalizerCfg, LoopCfg, StageCfg};
use crate::error::{BuildError, Result};
use crate::fps::FrameRateCounter;
use crate::localizer::Localizer;
use crate::stage::StageController;
use crate::transform::CoordinateTransform;
use crate::tracker::Tracker;

/// Boxed tracker for callers that pick backends at runtime.
pub type DynTracker = Tracker<Box<dyn Camera>, Box<dyn SerialLink>>;

const FPS_WINDOW: usize = 10;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

pub struct TrackerBuilder<C, S, T> {
    camera: Option<Box<dyn Camera>>,
    link: Option<Box<dyn SerialLink>>,
    transform: Option<CoordinateTransform>,
    localizer: LocalizerCfg,
    clicks: Option<ClickReceiver>,
    stage: StageCfg,
    run: LoopCfg,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    _c: PhantomData<C>,
    _s: PhantomData<S>,
    _t: PhantomData<T>,
}

impl Default for TrackerBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            camera: None,
            link: None,
            transform: None,
            localizer: LocalizerCfg::default(),
            clicks: None,
            stage: StageCfg::default(),
            run: LoopCfg::default(),
            clock: None,
            _c: PhantomData,
            _s: PhantomData,
            _t: PhantomData,
        }
    }
}

impl DynTracker {
    pub fn builder() -> TrackerBuilder<Missing, Missing, Missing> {
        TrackerBuilder::default()
    }
}

fn invalid(msg: &'static str) -> eyre::Report {
    eyre::Report::new(BuildError::InvalidConfig(msg))
}

fn validate(loc: &LocalizerCfg, stage: &StageCfg, run: &LoopCfg) -> Result<()> {
    if !(1..=1000).contains(&loc.background_divisor) {
        return Err(invalid("background_divisor must be in [1, 1000]"));
    }
    if !(loc.learning_rate > 0.0 && loc.learning_rate <= 1.0) {
        return Err(invalid("learning_rate must be in (0, 1]"));
    }
    if stage.max_read_attempts == 0 {
        return Err(invalid("max_read_attempts must be >= 1"));
    }
    if stage.read_timeout_ms == 0 {
        return Err(invalid("read_timeout_ms must be >= 1"));
    }
    if !stage.deadband.is_finite() || stage.deadband < 0.0 {
        return Err(invalid("deadband must be finite and >= 0"));
    }
    if run.frame_timeout_ms == 0 {
        return Err(invalid("frame_timeout_ms must be >= 1"));
    }
    if run.rehome_after_polls == Some(0) {
        return Err(invalid("rehome_after_polls must be >= 1 when set"));
    }
    Ok(())
}

/// Validate configuration and assemble a tracker.
///
/// Shared by `TrackerBuilder::try_build()` and `build_tracker()`.
#[allow(clippy::too_many_arguments)]
fn validate_and_build<C: Camera, L: SerialLink>(
    camera: C,
    link: L,
    transform: CoordinateTransform,
    localizer: LocalizerCfg,
    clicks: Option<ClickReceiver>,
    stage: StageCfg,
    run: LoopCfg,
    clock: Option<Box<dyn Clock + Send + Sync>>,
) -> Result<Tracker<C, L>> {
    if !transform.is_loaded() {
        return Err(eyre::Report::new(BuildError::MissingTransform));
    }
    validate(&localizer, &stage, &run)?;

    let clock: Arc<dyn Clock + Send + Sync> = match clock {
        Some(b) => Arc::from(b),
        None => Arc::new(MonotonicClock::new()),
    };
    let localizer = match clicks {
        Some(rx) => Localizer::click(rx),
        None => Localizer::blob(localizer),
    };

    Ok(Tracker {
        camera,
        localizer,
        transform,
        stage: StageController::new(link, stage),
        cfg: run,
        clock,
        fps: FrameRateCounter::new(FPS_WINDOW),
        frames: 0,
        false_polls: 0,
    })
}

impl<C, S, T> TrackerBuilder<C, S, T> {
    /// Fallible build available in any type-state; reports the missing piece.
    pub fn try_build(self) -> Result<DynTracker> {
        let camera = self
            .camera
            .ok_or_else(|| eyre::Report::new(BuildError::MissingCamera))?;
        let link = self
            .link
            .ok_or_else(|| eyre::Report::new(BuildError::MissingStage))?;
        let transform = self
            .transform
            .ok_or_else(|| eyre::Report::new(BuildError::MissingTransform))?;
        validate_and_build(
            camera,
            link,
            transform,
            self.localizer,
            self.clicks,
            self.stage,
            self.run,
            self.clock,
        )
    }

    pub fn with_localizer(mut self, cfg: LocalizerCfg) -> Self {
        self.localizer = cfg;
        self
    }

    /// Track pointing-device clicks instead of detecting blobs.
    pub fn with_clicks(mut self, clicks: ClickReceiver) -> Self {
        self.clicks = Some(clicks);
        self
    }

    pub fn with_stage_cfg(mut self, cfg: StageCfg) -> Self {
        self.stage = cfg;
        self
    }

    pub fn with_loop_cfg(mut self, cfg: LoopCfg) -> Self {
        self.run = cfg;
        self
    }

    /// Provide a custom clock; defaults to `MonotonicClock`.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
}

// Setters that advance type-state

impl<S, T> TrackerBuilder<Missing, S, T> {
    pub fn with_camera(self, camera: impl Camera + 'static) -> TrackerBuilder<Set, S, T> {
        TrackerBuilder {
            camera: Some(Box::new(camera)),
            link: self.link,
            transform: self.transform,
            localizer: self.localizer,
            clicks: self.clicks,
            stage: self.stage,
            run: self.run,
            clock: self.clock,
            _c: PhantomData,
            _s: PhantomData,
            _t: PhantomData,
        }
    }
}

impl<C, T> TrackerBuilder<C, Missing, T> {
    pub fn with_stage(self, link: impl SerialLink + 'static) -> TrackerBuilder<C, Set, T> {
        TrackerBuilder {
            camera: self.camera,
            link: Some(Box::new(link)),
            transform: self.transform,
            localizer: self.localizer,
            clicks: self.clicks,
            stage: self.stage,
            run: self.run,
            clock: self.clock,
            _c: PhantomData,
            _s: PhantomData,
            _t: PhantomData,
        }
    }
}

impl<C, S> TrackerBuilder<C, S, Missing> {
    pub fn with_transform(self, transform: CoordinateTransform) -> TrackerBuilder<C, S, Set> {
        TrackerBuilder {
            camera: self.camera,
            link: self.link,
            transform: Some(transform),
            localizer: self.localizer,
            clicks: self.clicks,
            stage: self.stage,
            run: self.run,
            clock: self.clock,
            _c: PhantomData,
            _s: PhantomData,
            _t: PhantomData,
        }
    }
}

impl TrackerBuilder<Set, Set, Set> {
    /// Validate and build. Only available once camera, stage and transform
    /// are set.
    pub fn build(self) -> Result<DynTracker> {
        self.try_build()
    }
}

/// Build a statically-dispatched tracker from concrete collaborators.
#[allow(clippy::too_many_arguments)]
pub fn build_tracker<C, L>(
    camera: C,
    link: L,
    transform: CoordinateTransform,
    localizer: LocalizerCfg,
    clicks: Option<ClickReceiver>,
    stage: StageCfg,
    run: LoopCfg,
    clock: Option<Box<dyn Clock + Send + Sync>>,
) -> Result<Tracker<C, L>>
where
    C: Camera,
    L: SerialLink,
{
    validate_and_build(camera, link, transform, localizer, clicks, stage, run, clock)
}
