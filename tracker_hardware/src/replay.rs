use std::path::{Path, PathBuf};
use std::time::Duration;

use tracker_traits::{BoxError, Camera, Clock, Frame, MonotonicClock};

use crate::error::{HwError, Result};
use crate::util;

/// Camera that plays back a directory of still images in file-name order.
///
/// Every image is converted to 8-bit luma. All frames must share the size of
/// the first one.
pub struct ReplayCamera {
    paths: Vec<PathBuf>,
    idx: usize,
    looping: bool,
    size: Option<(u32, u32)>,
    period: Option<Duration>,
    clock: MonotonicClock,
    started: bool,
}

const EXTENSIONS: &[&str] = &["png", "pgm", "pnm", "ppm"];

impl ReplayCamera {
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let ok = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
            if ok {
                paths.push(path);
            }
        }
        if paths.is_empty() {
            return Err(HwError::Image(format!("no images in {}", dir.display())));
        }
        paths.sort();
        tracing::info!(dir = %dir.display(), frames = paths.len(), "replay camera loaded");
        Ok(Self {
            paths,
            idx: 0,
            looping: true,
            size: None,
            period: None,
            clock: MonotonicClock::new(),
            started: false,
        })
    }

    /// Stop after the last image instead of wrapping around.
    pub fn once(mut self) -> Self {
        self.looping = false;
        self
    }

    pub fn with_rate(mut self, hz: u32) -> Self {
        self.period = util::period_from_hz(hz);
        self
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    fn next_frame(&mut self) -> Result<Frame> {
        if self.idx >= self.paths.len() {
            if !self.looping {
                return Err(HwError::Exhausted(self.paths.len()));
            }
            self.idx = 0;
        }
        let path = &self.paths[self.idx];
        self.idx += 1;
        let img = image::open(path)
            .map_err(|e| HwError::Image(format!("{}: {e}", path.display())))?
            .into_luma8();
        let got = img.dimensions();
        match self.size {
            None => self.size = Some(got),
            Some(expected) if expected != got => {
                return Err(HwError::FrameSize { expected, got });
            }
            Some(_) => {}
        }
        Ok(img)
    }
}

impl Camera for ReplayCamera {
    fn start(&mut self) -> std::result::Result<(), BoxError> {
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) -> std::result::Result<(), BoxError> {
        self.started = false;
        Ok(())
    }

    fn acquire(&mut self, _timeout: Duration) -> std::result::Result<Frame, BoxError> {
        if !self.started {
            return Err(Box::new(HwError::NotStarted));
        }
        if let Some(p) = self.period {
            self.clock.sleep(p);
        }
        self.next_frame().map_err(|e| Box::new(e) as BoxError)
    }
}
