//! Runtime configuration for the tracking loop.
//!
//! These are the structs consumed by `tracker_core`; the TOML schema lives in
//! `tracker_config` and is converted via `crate::conversions`.

/// Which side of the background the organism sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Polarity {
    /// `|bg - frame|`
    #[default]
    Absolute,
    /// Organism darker than the background.
    Darker,
    /// Organism brighter than the background.
    Brighter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackgroundKind {
    /// Exponential running average with the configured learning rate.
    #[default]
    RunningAverage,
    /// Per-pixel maximum; suited to dark organisms on a bright field.
    Maximum,
}

/// Blob localizer parameters.
#[derive(Debug, Clone)]
pub struct LocalizerCfg {
    /// Update the background on every K-th frame.
    pub background_divisor: u32,
    /// Running-average weight of the new frame, in (0, 1].
    pub learning_rate: f32,
    /// A pixel is foreground when its difference exceeds this.
    pub threshold: u8,
    pub polarity: Polarity,
    pub background: BackgroundKind,
    /// Apply a 3x3 erosion to the mask before localizing.
    pub erode: bool,
}

impl Default for LocalizerCfg {
    fn default() -> Self {
        Self {
            background_divisor: 10,
            learning_rate: 0.01,
            threshold: 25,
            polarity: Polarity::Absolute,
            background: BackgroundKind::RunningAverage,
            erode: false,
        }
    }
}

/// Stage link behavior.
#[derive(Debug, Clone)]
pub struct StageCfg {
    /// Device node, reported when it is missing.
    pub device_path: String,
    /// Per-attempt wait for a response line.
    pub read_timeout_ms: u64,
    /// Attempts before a read is reported as exhausted. At least 1.
    pub max_read_attempts: u32,
    /// Moves closer than this to the last commanded target are suppressed.
    /// 0 disables the deadband.
    pub deadband: f64,
    /// Substring the `[getDeviceId]` response must contain.
    pub device_id_token: String,
    /// Echo every protocol line at info level.
    pub debug: bool,
}

impl Default for StageCfg {
    fn default() -> Self {
        Self {
            device_path: "/dev/ttyACM0".to_string(),
            read_timeout_ms: 100,
            max_read_attempts: 10,
            deadband: 100.0,
            device_id_token: "stage".to_string(),
            debug: false,
        }
    }
}

/// Operating mode flags and loop pacing. Fixed for the lifetime of a run.
#[derive(Debug, Clone)]
pub struct LoopCfg {
    /// Skip frame acquisition entirely.
    pub blind: bool,
    /// Localize and transform but never actuate.
    pub paralyzed: bool,
    pub frame_timeout_ms: u64,
    /// Sleep per cycle when blind.
    pub idle_ms: u64,
    /// Log the frame rate every N frames; 0 disables.
    pub report_every: u64,
    /// Re-issue `home()` after this many consecutive false homing polls.
    pub rehome_after_polls: Option<u32>,
    /// Stop `run()` after this many cycles.
    pub max_cycles: Option<u64>,
}

impl Default for LoopCfg {
    fn default() -> Self {
        Self {
            blind: false,
            paralyzed: false,
            frame_timeout_ms: 500,
            idle_ms: 20,
            report_every: 100,
            rehome_after_polls: None,
            max_cycles: None,
        }
    }
}
