//! Per-frame target localization.
//!
//! Two strategies share the [`Locate`] contract: automatic blob detection
//! (background subtraction, threshold, optional erosion, centroid) and manual
//! clicks from a pointing device. Both report `None` when there is no target
//! this cycle.

use tracker_traits::Frame;

use crate::background::BackgroundModel;
use crate::click::ClickReceiver;
use crate::config::{LocalizerCfg, Polarity};

/// Target location in image pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

pub trait Locate {
    fn locate(&mut self, frame: &Frame) -> Option<PixelPoint>;
}

/// Binary foreground mask, row-major.
#[derive(Debug, Clone, Default)]
pub struct Mask {
    pub width: u32,
    pub height: u32,
    pub bits: Vec<bool>,
}

impl Mask {
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    fn reset(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.bits.clear();
        self.bits.resize(width as usize * height as usize, false);
    }
}

/// Threshold the background/frame difference into `out`.
///
/// `background` must have one entry per frame pixel.
pub fn foreground_mask(
    background: &[f32],
    frame: &Frame,
    polarity: Polarity,
    threshold: u8,
    out: &mut Mask,
) {
    let (w, h) = frame.dimensions();
    out.reset(w, h);
    let thr = f32::from(threshold);
    for ((bit, bg), px) in out.bits.iter_mut().zip(background).zip(frame.as_raw()) {
        let px = f32::from(*px);
        let diff = match polarity {
            Polarity::Absolute => (bg - px).abs(),
            Polarity::Darker => (bg - px).max(0.0),
            Polarity::Brighter => (px - bg).max(0.0),
        };
        *bit = diff > thr;
    }
}

/// 3x3 square erosion. Pixels on the image border are always cleared.
pub fn erode3x3(mask: &Mask, out: &mut Mask) {
    let (w, h) = (mask.width as usize, mask.height as usize);
    out.reset(mask.width, mask.height);
    if w < 3 || h < 3 {
        return;
    }
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let keep = (y - 1..=y + 1)
                .all(|yy| (x - 1..=x + 1).all(|xx| mask.bits[yy * w + xx]));
            out.bits[y * w + x] = keep;
        }
    }
}

/// Mean of all foreground coordinates.
///
/// An empty mask has no target. A mask that is entirely foreground says
/// nothing about where the organism is, so it is rejected too.
pub fn centroid(mask: &Mask) -> Option<PixelPoint> {
    let w = mask.width as usize;
    if w == 0 {
        return None;
    }
    let (mut n, mut sx, mut sy) = (0u64, 0f64, 0f64);
    for (i, _) in mask.bits.iter().enumerate().filter(|(_, b)| **b) {
        n += 1;
        sx += (i % w) as f64;
        sy += (i / w) as f64;
    }
    if n == 0 || n as usize == mask.bits.len() {
        return None;
    }
    Some(PixelPoint::new(sx / n as f64, sy / n as f64))
}

/// Automatic localizer: background subtraction plus centroid.
#[derive(Debug, Clone)]
pub struct BlobLocalizer {
    cfg: LocalizerCfg,
    background: BackgroundModel,
    mask: Mask,
    scratch: Mask,
}

impl BlobLocalizer {
    pub fn new(cfg: LocalizerCfg) -> Self {
        let background =
            BackgroundModel::new(cfg.background, cfg.learning_rate, cfg.background_divisor);
        Self {
            cfg,
            background,
            mask: Mask::default(),
            scratch: Mask::default(),
        }
    }

    pub fn background(&self) -> &BackgroundModel {
        &self.background
    }

    /// Foreground mask from the last `locate` call (after erosion, if enabled).
    pub fn mask(&self) -> &Mask {
        &self.mask
    }
}

impl Locate for BlobLocalizer {
    fn locate(&mut self, frame: &Frame) -> Option<PixelPoint> {
        self.background.observe(frame);
        let bg = self.background.as_slice()?;
        foreground_mask(bg, frame, self.cfg.polarity, self.cfg.threshold, &mut self.mask);
        if self.cfg.erode {
            erode3x3(&self.mask, &mut self.scratch);
            std::mem::swap(&mut self.mask, &mut self.scratch);
        }
        centroid(&self.mask)
    }
}

/// Manual localizer: the most recent click, valid for one cycle.
#[derive(Debug)]
pub struct ClickLocalizer {
    clicks: ClickReceiver,
}

impl ClickLocalizer {
    pub fn new(clicks: ClickReceiver) -> Self {
        Self { clicks }
    }
}

impl Locate for ClickLocalizer {
    /// Clicks outside the frame are consumed but yield no target.
    fn locate(&mut self, frame: &Frame) -> Option<PixelPoint> {
        let p = self.clicks.latest()?;
        let (w, h) = frame.dimensions();
        let inside = (0.0..f64::from(w)).contains(&p.x) && (0.0..f64::from(h)).contains(&p.y);
        if !inside {
            tracing::debug!(x = p.x, y = p.y, width = w, height = h, "click outside frame");
            return None;
        }
        Some(p)
    }
}

/// Strategy chosen once at startup.
#[derive(Debug)]
pub enum Localizer {
    Blob(BlobLocalizer),
    Click(ClickLocalizer),
}

impl Localizer {
    pub fn blob(cfg: LocalizerCfg) -> Self {
        Self::Blob(BlobLocalizer::new(cfg))
    }

    pub fn click(clicks: ClickReceiver) -> Self {
        Self::Click(ClickLocalizer::new(clicks))
    }
}

impl Locate for Localizer {
    fn locate(&mut self, frame: &Frame) -> Option<PixelPoint> {
        match self {
            Self::Blob(b) => b.locate(frame),
            Self::Click(c) => c.locate(frame),
        }
    }
}
