//! `From` implementations bridging `tracker_config` types to `tracker_core` types.

use crate::config::{BackgroundKind, LocalizerCfg, LoopCfg, Polarity, StageCfg};

impl From<tracker_config::Polarity> for Polarity {
    fn from(p: tracker_config::Polarity) -> Self {
        match p {
            tracker_config::Polarity::Absolute => Self::Absolute,
            tracker_config::Polarity::Darker => Self::Darker,
            tracker_config::Polarity::Brighter => Self::Brighter,
        }
    }
}

impl From<tracker_config::BackgroundKind> for BackgroundKind {
    fn from(k: tracker_config::BackgroundKind) -> Self {
        match k {
            tracker_config::BackgroundKind::RunningAverage => Self::RunningAverage,
            tracker_config::BackgroundKind::Maximum => Self::Maximum,
        }
    }
}

impl From<&tracker_config::LocalizerCfg> for LocalizerCfg {
    fn from(c: &tracker_config::LocalizerCfg) -> Self {
        Self {
            background_divisor: c.background_divisor,
            learning_rate: c.learning_rate,
            threshold: c.threshold,
            polarity: c.polarity.into(),
            background: c.background.into(),
            erode: c.erode,
        }
    }
}

impl From<&tracker_config::StageCfg> for StageCfg {
    fn from(c: &tracker_config::StageCfg) -> Self {
        Self {
            device_path: c.device_path.clone(),
            read_timeout_ms: c.read_timeout_ms,
            max_read_attempts: c.max_read_attempts,
            deadband: c.deadband,
            device_id_token: c.device_id_token.clone(),
            debug: false,
        }
    }
}

/// Stage settings plus the `[run] debug` echo flag.
impl From<&tracker_config::Config> for StageCfg {
    fn from(c: &tracker_config::Config) -> Self {
        Self {
            debug: c.run.debug,
            ..Self::from(&c.stage)
        }
    }
}

impl From<&tracker_config::Config> for LoopCfg {
    fn from(c: &tracker_config::Config) -> Self {
        Self {
            blind: c.run.blind,
            paralyzed: c.run.paralyzed,
            frame_timeout_ms: c.camera.frame_timeout_ms,
            idle_ms: c.run.idle_ms,
            report_every: c.run.report_every,
            rehome_after_polls: c.stage.rehome_after_polls,
            max_cycles: None,
        }
    }
}
