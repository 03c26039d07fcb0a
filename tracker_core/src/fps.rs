use std::collections::VecDeque;
use std::time::Instant;

/// Rolling frame-rate estimate over the last `window` frame timestamps.
#[derive(Debug, Clone)]
pub struct FrameRateCounter {
    stamps: VecDeque<Instant>,
    window: usize,
}

impl Default for FrameRateCounter {
    fn default() -> Self {
        Self::new(10)
    }
}

impl FrameRateCounter {
    pub fn new(window: usize) -> Self {
        let window = window.max(2);
        Self {
            stamps: VecDeque::with_capacity(window),
            window,
        }
    }

    pub fn tick(&mut self, now: Instant) {
        if self.stamps.len() == self.window {
            self.stamps.pop_front();
        }
        self.stamps.push_back(now);
    }

    /// Frames per second across the window; `None` until two frames with
    /// distinct timestamps have been seen.
    pub fn fps(&self) -> Option<f64> {
        let (first, last) = (self.stamps.front()?, self.stamps.back()?);
        let span = last.saturating_duration_since(*first).as_secs_f64();
        if span <= 0.0 {
            return None;
        }
        Some((self.stamps.len() - 1) as f64 / span)
    }
}
