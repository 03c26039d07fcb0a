#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and calibration file parsing for the stage tracker.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Calibration files hold the image-to-stage homography either as a TOML
//!   array of rows or as a CSV with strict `h0,h1,h2` headers. Loaders only
//!   return rows; shape and degeneracy checks belong to the core.
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Key under which calibration files store the matrix.
pub const HOMOGRAPHY_KEY: &str = "homography_image_to_stage";

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CameraBackend {
    #[default]
    Simulated,
    Replay,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CameraCfg {
    pub backend: CameraBackend,
    /// Frame width in pixels (simulated backend).
    pub width: u32,
    /// Frame height in pixels (simulated backend).
    pub height: u32,
    /// Directory of images played back in name order (replay backend).
    pub frames_dir: Option<PathBuf>,
    /// Max wait for one frame (ms).
    pub frame_timeout_ms: u64,
    /// Pacing of synthetic frames in Hz (0 = as fast as possible).
    pub sample_rate_hz: u32,
}

impl Default for CameraCfg {
    fn default() -> Self {
        Self {
            backend: CameraBackend::Simulated,
            width: 640,
            height: 480,
            frames_dir: None,
            frame_timeout_ms: 500,
            sample_rate_hz: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TargetMode {
    #[default]
    Blob,
    Mouse,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    #[default]
    Absolute,
    Darker,
    Brighter,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundKind {
    #[default]
    RunningAverage,
    Maximum,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LocalizerCfg {
    pub mode: TargetMode,
    /// Update the background every N-th frame.
    pub background_divisor: u32,
    /// Weight of the new frame in a running-average update, in (0.0, 1.0].
    pub learning_rate: f32,
    /// Foreground cutoff on the 0..=255 difference image.
    pub threshold: u8,
    pub polarity: Polarity,
    pub background: BackgroundKind,
    /// Apply a 3x3 erosion to the mask before taking the centroid.
    pub erode: bool,
}

impl Default for LocalizerCfg {
    fn default() -> Self {
        Self {
            mode: TargetMode::Blob,
            background_divisor: 10,
            learning_rate: 0.01,
            threshold: 25,
            polarity: Polarity::Absolute,
            background: BackgroundKind::RunningAverage,
            erode: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StageCfg {
    pub device_path: String,
    pub baud_rate: u32,
    /// Per-attempt wait for a response line (ms).
    pub read_timeout_ms: u64,
    /// Attempts before a read is reported as failed.
    pub max_read_attempts: u32,
    /// Moves closer than this (stage units) to the last commanded target are dropped.
    pub deadband: f64,
    /// Substring the device-id response must contain.
    pub device_id_token: String,
    /// Re-issue `home` after this many consecutive negative homing polls.
    pub rehome_after_polls: Option<u32>,
}

impl Default for StageCfg {
    fn default() -> Self {
        Self {
            device_path: "/dev/ttyACM0".to_string(),
            baud_rate: 115_200,
            read_timeout_ms: 100,
            max_read_attempts: 10,
            deadband: 100.0,
            device_id_token: "stage".to_string(),
            rehome_after_polls: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RunCfg {
    /// Skip frame acquisition entirely.
    pub blind: bool,
    /// Never command the stage.
    pub paralyzed: bool,
    /// Echo every protocol line to the log.
    pub debug: bool,
    /// Sleep between cycles when there is nothing to sense (ms).
    pub idle_ms: u64,
    /// Log the frame rate every N frames (0 disables).
    pub report_every: u64,
}

impl Default for RunCfg {
    fn default() -> Self {
        Self {
            blind: false,
            paralyzed: false,
            debug: false,
            idle_ms: 20,
            report_every: 100,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct CalibrationCfg {
    /// Calibration file (`.toml` or `.csv`).
    pub path: Option<PathBuf>,
    /// Inline matrix rows; used when `path` is absent.
    pub homography_image_to_stage: Option<Vec<Vec<f64>>>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub camera: CameraCfg,
    pub localizer: LocalizerCfg,
    pub stage: StageCfg,
    pub run: RunCfg,
    pub calibration: CalibrationCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Camera
        if self.camera.width == 0 || self.camera.height == 0 {
            eyre::bail!("camera.width and camera.height must be > 0");
        }
        if self.camera.frame_timeout_ms == 0 {
            eyre::bail!("camera.frame_timeout_ms must be >= 1");
        }
        if self.camera.backend == CameraBackend::Replay && self.camera.frames_dir.is_none() {
            eyre::bail!("camera.frames_dir is required for the replay backend");
        }

        // Localizer
        if !(1..=1000).contains(&self.localizer.background_divisor) {
            eyre::bail!("localizer.background_divisor must be in [1, 1000]");
        }
        let lr = self.localizer.learning_rate;
        if !(lr > 0.0 && lr <= 1.0) {
            eyre::bail!("localizer.learning_rate must be in (0.0, 1.0]");
        }

        // Stage
        if self.stage.device_path.trim().is_empty() {
            eyre::bail!("stage.device_path must not be empty");
        }
        if self.stage.baud_rate == 0 {
            eyre::bail!("stage.baud_rate must be > 0");
        }
        if self.stage.read_timeout_ms == 0 {
            eyre::bail!("stage.read_timeout_ms must be >= 1");
        }
        if self.stage.max_read_attempts == 0 {
            eyre::bail!("stage.max_read_attempts must be >= 1");
        }
        if !self.stage.deadband.is_finite() || self.stage.deadband < 0.0 {
            eyre::bail!("stage.deadband must be a finite value >= 0");
        }
        if self.stage.device_id_token.is_empty() {
            eyre::bail!("stage.device_id_token must not be empty");
        }
        if self.stage.rehome_after_polls == Some(0) {
            eyre::bail!("stage.rehome_after_polls must be >= 1 when set");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }

    /// Resolve the configured calibration: file first, then inline rows.
    pub fn calibration_rows(&self) -> eyre::Result<Vec<Vec<f64>>> {
        if let Some(path) = &self.calibration.path {
            return load_calibration_file(path);
        }
        match &self.calibration.homography_image_to_stage {
            Some(rows) => Ok(rows.clone()),
            None => eyre::bail!("no calibration configured (calibration.path or calibration.{HOMOGRAPHY_KEY})"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CalibrationToml {
    homography_image_to_stage: Vec<Vec<f64>>,
}

/// Calibration CSV schema: one matrix row per record.
///
/// Expected headers:
/// h0,h1,h2
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct HomographyRow {
    pub h0: f64,
    pub h1: f64,
    pub h2: f64,
}

/// Load matrix rows from a calibration file, picking the parser by extension.
pub fn load_calibration_file(path: &Path) -> eyre::Result<Vec<Vec<f64>>> {
    if !path.exists() {
        eyre::bail!("calibration file {:?} does not exist", path);
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => load_calibration_csv(path),
        _ => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| eyre::eyre!("read calibration file {:?}: {}", path, e))?;
            load_calibration_toml(&text)
        }
    }
}

pub fn load_calibration_toml(s: &str) -> eyre::Result<Vec<Vec<f64>>> {
    let parsed: CalibrationToml =
        toml::from_str(s).map_err(|e| eyre::eyre!("invalid calibration TOML: {}", e))?;
    Ok(parsed.homography_image_to_stage)
}

pub fn load_calibration_csv(path: &Path) -> eyre::Result<Vec<Vec<f64>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open calibration CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["h0", "h1", "h2"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "calibration CSV must have headers 'h0,h1,h2', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<HomographyRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(vec![row.h0, row.h1, row.h2]),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_valid_defaults() {
        let cfg = load_toml("").expect("parse empty TOML");
        cfg.validate().expect("defaults validate");
        assert_eq!(cfg.localizer.threshold, 25);
        assert_eq!(cfg.localizer.background_divisor, 10);
        assert_eq!(cfg.stage.max_read_attempts, 10);
        assert_eq!(cfg.localizer.mode, TargetMode::Blob);
    }

    #[test]
    fn inline_calibration_rows_are_returned() {
        let cfg = load_toml(
            r#"
[calibration]
homography_image_to_stage = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]
"#,
        )
        .expect("parse");
        let rows = cfg.calibration_rows().expect("rows");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2], vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn missing_calibration_is_reported() {
        let cfg = load_toml("").expect("parse");
        let err = cfg.calibration_rows().expect_err("nothing configured");
        assert!(err.to_string().contains("no calibration configured"));
    }
}
