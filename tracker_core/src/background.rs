//! Adaptive background estimate for foreground segmentation.

use tracker_traits::Frame;

use crate::config::BackgroundKind;

/// Per-pixel background raster, decimated to every K-th frame.
///
/// Values are held as `f32` so a small learning rate still moves the
/// estimate; an 8-bit buffer would round every update away.
#[derive(Debug, Clone)]
pub struct BackgroundModel {
    kind: BackgroundKind,
    learning_rate: f32,
    divisor: u64,
    frame_n: u64,
    dims: (u32, u32),
    data: Option<Vec<f32>>,
}

impl BackgroundModel {
    pub fn new(kind: BackgroundKind, learning_rate: f32, divisor: u32) -> Self {
        Self {
            kind,
            learning_rate: learning_rate.clamp(0.0, 1.0),
            divisor: u64::from(divisor.max(1)),
            frame_n: 0,
            dims: (0, 0),
            data: None,
        }
    }

    /// Feed one frame. Returns `true` when the estimate changed.
    ///
    /// Frame 0 seeds the model; afterwards only frames with
    /// `n % divisor == 0` update it. A frame of a different size re-seeds.
    pub fn observe(&mut self, frame: &Frame) -> bool {
        let n = self.frame_n;
        self.frame_n = self.frame_n.wrapping_add(1);
        let dims = frame.dimensions();
        if self.data.is_none() {
            self.seed(frame);
            return true;
        }
        if dims != self.dims {
            tracing::warn!(
                old = ?self.dims,
                new = ?dims,
                "frame size changed; re-seeding background"
            );
            self.seed(frame);
            return true;
        }
        if n % self.divisor != 0 {
            return false;
        }
        let alpha = self.learning_rate;
        let Some(bg) = self.data.as_mut() else {
            return false;
        };
        let px = frame.as_raw();
        match self.kind {
            BackgroundKind::RunningAverage => {
                for (b, p) in bg.iter_mut().zip(px) {
                    *b = (1.0 - alpha).mul_add(*b, alpha * f32::from(*p));
                }
            }
            BackgroundKind::Maximum => {
                for (b, p) in bg.iter_mut().zip(px) {
                    *b = b.max(f32::from(*p));
                }
            }
        }
        true
    }

    fn seed(&mut self, frame: &Frame) {
        self.dims = frame.dimensions();
        self.data = Some(frame.as_raw().iter().map(|p| f32::from(*p)).collect());
        tracing::debug!(width = self.dims.0, height = self.dims.1, "background seeded");
    }

    pub fn is_seeded(&self) -> bool {
        self.data.is_some()
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.data.as_ref().map(|_| self.dims)
    }

    /// Row-major raster, if seeded.
    pub fn as_slice(&self) -> Option<&[f32]> {
        self.data.as_deref()
    }

    pub fn frames_seen(&self) -> u64 {
        self.frame_n
    }
}
