//! Sources of the image-to-stage calibration matrix.

use std::path::PathBuf;

use eyre::WrapErr;

/// Supplies the raw calibration matrix rows. Shape is checked by the caller.
pub trait CalibrationSource {
    fn load_rows(&self) -> eyre::Result<Vec<Vec<f64>>>;
}

/// Rows already in memory (inline config, tests).
#[derive(Debug, Clone)]
pub struct StaticCalibration {
    rows: Vec<Vec<f64>>,
}

impl StaticCalibration {
    pub fn new(rows: Vec<Vec<f64>>) -> Self {
        Self { rows }
    }

    pub fn identity() -> Self {
        Self::new(vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ])
    }
}

impl CalibrationSource for StaticCalibration {
    fn load_rows(&self) -> eyre::Result<Vec<Vec<f64>>> {
        Ok(self.rows.clone())
    }
}

/// Calibration file on disk: TOML with a `homography_image_to_stage` key or
/// a CSV with `h0,h1,h2` headers.
#[derive(Debug, Clone)]
pub struct FileCalibration {
    path: PathBuf,
}

impl FileCalibration {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CalibrationSource for FileCalibration {
    fn load_rows(&self) -> eyre::Result<Vec<Vec<f64>>> {
        tracker_config::load_calibration_file(&self.path)
            .wrap_err_with(|| format!("reading calibration {}", self.path.display()))
    }
}

/// Whatever the loaded config names: a file path or inline rows.
impl CalibrationSource for tracker_config::Config {
    fn load_rows(&self) -> eyre::Result<Vec<Vec<f64>>> {
        self.calibration_rows()
    }
}
