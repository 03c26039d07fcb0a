//! Image-to-stage projective mapping.

use nalgebra::{Matrix3, Vector3};

use crate::calibration::CalibrationSource;
use crate::error::{Result, TrackerError, TransformError};
use crate::localizer::PixelPoint;

/// |w'| below this means the point maps to infinity.
pub const W_EPSILON: f64 = 1e-12;
/// |det| at or below this is treated as singular.
pub const DET_EPSILON: f64 = 1e-12;

/// Target location in stage units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StagePoint {
    pub x: f64,
    pub y: f64,
}

impl StagePoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Validated, invertible 3x3 homography.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography(Matrix3<f64>);

impl Homography {
    /// Build from rows, requiring exactly 3x3 finite values and a
    /// non-singular matrix.
    pub fn from_rows(rows: &[Vec<f64>]) -> std::result::Result<Self, TrackerError> {
        if rows.len() != 3 {
            return Err(TrackerError::Calibration(format!(
                "expected 3 rows, got {}",
                rows.len()
            )));
        }
        if let Some((i, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != 3) {
            return Err(TrackerError::Calibration(format!(
                "row {i} has {} values, expected 3",
                r.len()
            )));
        }
        if rows.iter().flatten().any(|v| !v.is_finite()) {
            return Err(TrackerError::Calibration(
                "matrix contains non-finite values".into(),
            ));
        }
        let m = Matrix3::from_fn(|r, c| rows[r][c]);
        let det = m.determinant();
        if det.abs() <= DET_EPSILON {
            return Err(TrackerError::Calibration(format!(
                "matrix is singular (det = {det:e})"
            )));
        }
        Ok(Self(m))
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.0
    }

    /// H * [x, y, 1]^T, dehomogenized.
    pub fn project(&self, x: f64, y: f64) -> std::result::Result<(f64, f64), TransformError> {
        let p = self.0 * Vector3::new(x, y, 1.0);
        if p[2].abs() < W_EPSILON {
            return Err(TransformError::AtInfinity);
        }
        Ok((p[0] / p[2], p[1] / p[2]))
    }

    pub fn inverse(&self) -> Option<Self> {
        self.0.try_inverse().map(Self)
    }
}

/// Pixel to stage mapping, loaded once and immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct CoordinateTransform {
    forward: Option<Homography>,
    inverse: Option<Homography>,
}

impl CoordinateTransform {
    /// An unloaded transform; `to_stage` fails until `load` succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_homography(h: Homography) -> Self {
        Self {
            inverse: h.inverse(),
            forward: Some(h),
        }
    }

    /// Read and validate the matrix from `source`.
    pub fn load(&mut self, source: &dyn CalibrationSource) -> Result<()> {
        if self.forward.is_some() {
            return Err(eyre::Report::new(TrackerError::State(
                "calibration already loaded".into(),
            )));
        }
        let rows = source.load_rows().map_err(|e| {
            eyre::Report::new(TrackerError::Calibration(format!("{e:#}")))
        })?;
        let h = Homography::from_rows(&rows).map_err(eyre::Report::new)?;
        tracing::info!(matrix = ?h.matrix().as_slice(), "calibration loaded");
        *self = Self::from_homography(h);
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.forward.is_some()
    }

    pub fn homography(&self) -> Option<&Homography> {
        self.forward.as_ref()
    }

    pub fn to_stage(&self, p: PixelPoint) -> Result<StagePoint> {
        let h = self.forward.as_ref().ok_or_else(|| {
            eyre::Report::new(TrackerError::Config("calibration not loaded".into()))
        })?;
        let (x, y) = h.project(p.x, p.y).map_err(eyre::Report::new)?;
        Ok(StagePoint::new(x, y))
    }

    /// Inverse mapping, for verifying a calibration.
    pub fn to_image(&self, s: StagePoint) -> Result<PixelPoint> {
        let h = self.inverse.as_ref().ok_or_else(|| {
            eyre::Report::new(TrackerError::Config("calibration not loaded".into()))
        })?;
        let (x, y) = h.project(s.x, s.y).map_err(eyre::Report::new)?;
        Ok(PixelPoint::new(x, y))
    }
}
